//! Insult submission, moderation and public pool routes.

use axum::{
    Json,
    Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    ApiError,
    ApiResult,
    AppState,
    params::{lenient_flag, lenient_id, require_operator, required},
};
use crate::{
    insults::Submission,
    models::{Insult, InsultStatus, PublicInsult},
};

/// Insult routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit-insult", post(submit_insult))
        .route("/my-insults", get(my_insults))
        .route("/admin-insults", get(admin_insults))
        .route("/approve-insult", post(approve_insult))
        .route("/reject-insult", post(reject_insult))
        .route("/insert-insult", post(insert_insult))
        .route("/delete-insult", post(delete_insult))
        .route("/insults", get(public_pool))
        .route("/random-approved-insult", get(random_insult))
        .route("/track-insult-click", post(track_click))
}

/// A donor's submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    pub text: Option<String>,
    pub submitted_by_name: Option<String>,
    pub submitted_by_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub show_name: bool,
}

/// Query naming a submitter.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Moderation queue filter.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
    pub auth: Option<String>,
}

/// Body naming an insult, with optional moderation details.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateBody {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i32>,
    pub approver_email: Option<String>,
    pub reason: Option<String>,
    pub auth: Option<String>,
}

/// Body of an operator publish.
#[derive(Debug, Deserialize)]
pub struct InsertBody {
    pub text: Option<String>,
    pub auth: Option<String>,
}

/// Optional page size for the public pool.
#[derive(Debug, Deserialize)]
pub struct PoolQuery {
    pub limit: Option<u32>,
}

fn insult_id(id: Option<i32>) -> ApiResult<i32> {
    id.ok_or_else(|| ApiError::bad_request("Missing insult ID."))
}

async fn submit_insult(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> ApiResult<Json<Submission>> {
    let (Ok(text), Ok(email)) = (
        required(body.text.as_deref(), "Missing required fields."),
        required(body.submitted_by_email.as_deref(), "Missing required fields."),
    ) else {
        return Err(ApiError::bad_request("Missing required fields."));
    };
    let submission = state
        .moderation
        .submit(text, body.submitted_by_name.as_deref(), email, body.show_name)
        .await?;
    Ok(Json(submission))
}

async fn my_insults(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Insult>>> {
    let email = required(query.email.as_deref(), "Missing email.")?;
    Ok(Json(state.moderation.list_by_email(email).await?))
}

async fn admin_insults(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<Insult>>> {
    require_operator(&state, query.auth.as_deref())?;
    let raw = required(query.status.as_deref(), "Missing status filter.")?;
    let status = raw
        .parse::<InsultStatus>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(Json(state.moderation.list_by_status(status).await?))
}

async fn approve_insult(
    State(state): State<AppState>,
    Json(body): Json<ModerateBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let id = insult_id(body.id)?;
    let approver = required(body.approver_email.as_deref(), "Missing approver email.")?;
    let success = state.moderation.approve(id, approver).await?;
    Ok(Json(json!({ "success": success })))
}

async fn reject_insult(
    State(state): State<AppState>,
    Json(body): Json<ModerateBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let id = insult_id(body.id)?;
    let success = state.moderation.reject(id, body.reason.as_deref()).await?;
    Ok(Json(json!({ "success": success })))
}

async fn insert_insult(
    State(state): State<AppState>,
    Json(body): Json<InsertBody>,
) -> ApiResult<Json<Submission>> {
    require_operator(&state, body.auth.as_deref())?;
    let text = required(body.text.as_deref(), "Missing required fields.")?;
    Ok(Json(state.moderation.insert_approved(text).await?))
}

async fn delete_insult(
    State(state): State<AppState>,
    Json(body): Json<ModerateBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let id = insult_id(body.id)?;
    let success = state.moderation.delete(id).await?;
    Ok(Json(json!({ "success": success })))
}

async fn public_pool(
    State(state): State<AppState>,
    Query(query): Query<PoolQuery>,
) -> ApiResult<Json<Vec<PublicInsult>>> {
    Ok(Json(
        state.moderation.list_approved_random(query.limit).await?,
    ))
}

async fn random_insult(State(state): State<AppState>) -> ApiResult<Json<PublicInsult>> {
    state
        .moderation
        .list_approved_random(Some(1))
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No approved insults found.".to_owned()))
}

async fn track_click(
    State(state): State<AppState>,
    Json(body): Json<ModerateBody>,
) -> ApiResult<Json<Value>> {
    let id = insult_id(body.id)?;
    let success = state.moderation.increment_click(id).await?;
    Ok(Json(json!({ "success": success })))
}
