//! Announcement routes.

use axum::{
    Json,
    Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    ApiError,
    ApiResult,
    AppState,
    params::{lenient_id, require_operator, required},
};
use crate::{
    announcements::{AnnouncementDraft, WindowBound, parse_timestamp},
    models::Announcement,
};

/// Announcement routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(active_announcements))
        .route(
            "/admin/announcements",
            get(all_announcements).post(create_announcement),
        )
        .route("/admin/update-announcement", post(update_announcement))
        .route("/admin/delete-announcement", post(delete_announcement))
        .route(
            "/admin/delete-all-announcements",
            post(delete_all_announcements),
        )
}

/// Query carrying the operator secret.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub auth: Option<String>,
}

/// Body of the create, update and delete routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementBody {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i32>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub created_by_email: Option<String>,
    pub auth: Option<String>,
}

/// Build a draft from a body, rejecting missing fields and unparseable
/// window bounds.
fn draft(body: &AnnouncementBody) -> ApiResult<AnnouncementDraft<'_>> {
    const MISSING: &str = "Missing required fields";
    let title = required(body.title.as_deref(), MISSING)?;
    let text = required(body.body.as_deref(), MISSING)?;
    let start = required(body.start.as_deref(), MISSING)?;
    let end = required(body.end.as_deref(), MISSING)?;
    Ok(AnnouncementDraft {
        title,
        body: text,
        category: body.category.as_deref(),
        starts_at: parse_timestamp(start, WindowBound::Start)?,
        ends_at: parse_timestamp(end, WindowBound::End)?,
    })
}

async fn active_announcements(State(state): State<AppState>) -> ApiResult<Json<Vec<Announcement>>> {
    let now = Utc::now().naive_utc();
    Ok(Json(state.announcements.list_active(now).await?))
}

async fn all_announcements(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> ApiResult<Json<Vec<Announcement>>> {
    require_operator(&state, query.auth.as_deref())?;
    Ok(Json(state.announcements.list_all().await?))
}

async fn create_announcement(
    State(state): State<AppState>,
    Json(body): Json<AnnouncementBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let draft = draft(&body)?;
    let id = state
        .announcements
        .create(&draft, body.created_by_email.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

async fn update_announcement(
    State(state): State<AppState>,
    Json(body): Json<AnnouncementBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let id = body
        .id
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    let draft = draft(&body)?;
    let success = state.announcements.update(id, &draft).await?;
    Ok(Json(json!({ "success": success })))
}

async fn delete_announcement(
    State(state): State<AppState>,
    Json(body): Json<AnnouncementBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let id = body
        .id
        .ok_or_else(|| ApiError::bad_request("Missing announcement ID"))?;
    let success = state.announcements.delete(id).await?;
    Ok(Json(json!({ "success": success })))
}

async fn delete_all_announcements(
    State(state): State<AppState>,
    Json(body): Json<AnnouncementBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let deleted = state.announcements.delete_all().await?;
    Ok(Json(json!({
        "success": true,
        "deleted": deleted,
        "message": format!("Successfully deleted {deleted} announcements."),
    })))
}
