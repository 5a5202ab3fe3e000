//! Donor onboarding and unlock-code routes.

use axum::{
    Json,
    Router,
    extract::{Query, State},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::{
    ApiError,
    ApiResult,
    AppState,
    params::{require_operator, required},
};
use crate::{access::authenticate, models::Donor, notify::CodeNotice};

/// Donor routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bmac-webhook", post(donation_webhook))
        .route("/resend-code", get(resend_code))
        .route("/delete-donor", delete(delete_donor))
        .route("/verify-code", get(verify_code))
        .route("/dev-list-donors", get(list_donors))
        .route("/manual-add-code", post(manual_add_code))
}

/// Payload posted by the donation platform after a payment.
#[derive(Debug, Deserialize)]
pub struct DonationPayload {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Query naming a donor.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Body of the operator donor removal.
#[derive(Debug, Deserialize)]
pub struct DeleteDonorBody {
    pub email: Option<String>,
    pub auth: Option<String>,
}

/// Query carrying credentials to check.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub email: Option<String>,
    pub code: Option<String>,
}

/// Verdict returned to the extension.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub valid: bool,
    pub is_admin: bool,
}

/// Query carrying the operator secret.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub auth: Option<String>,
}

/// Body of the operator manual add.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAddBody {
    pub email: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub auth: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

async fn donation_webhook(
    State(state): State<AppState>,
    Json(body): Json<DonationPayload>,
) -> ApiResult<Json<Value>> {
    let (Ok(email), Ok(name)) = (
        required(body.email.as_deref(), "Missing required fields."),
        required(body.name.as_deref(), "Missing required fields."),
    ) else {
        return Err(ApiError::bad_request("Missing required fields."));
    };
    let (code, fresh) = state.identity.onboard(name, email).await?;
    let notice = if fresh {
        CodeNotice::Welcome
    } else {
        CodeNotice::Repeat
    };
    info!(%email, fresh, "donation processed");
    state.notifier.send_code(email, name, &code, notice).await?;
    Ok(Json(json!({ "success": true })))
}

async fn resend_code(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Value>> {
    let email = required(query.email.as_deref(), "Missing email.")?;
    let code = state
        .identity
        .lookup_code(email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No unlock code found for this email.".to_owned()))?;
    state
        .notifier
        .send_code(email, email, &code, CodeNotice::Resend)
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_donor(
    State(state): State<AppState>,
    Json(body): Json<DeleteDonorBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let email = required(body.email.as_deref(), "Missing email")?;
    if !state.identity.remove_donor(email).await? {
        return Err(ApiError::NotFound("No matching donor found".to_owned()));
    }
    Ok(Json(json!({ "success": true, "message": format!("Deleted donor {email}") })))
}

async fn verify_code(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<Json<Verification>> {
    let (Ok(email), Ok(code)) = (
        required(query.email.as_deref(), "Missing email or code"),
        required(query.code.as_deref(), "Missing email or code"),
    ) else {
        return Err(ApiError::bad_request("Missing email or code"));
    };
    let principal = authenticate(&state.identity, email, code).await?;
    Ok(Json(Verification {
        valid: principal.is_some(),
        is_admin: principal.is_some_and(|p| p.is_admin()),
    }))
}

async fn list_donors(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> ApiResult<Json<Vec<Donor>>> {
    require_operator(&state, query.auth.as_deref())?;
    Ok(Json(state.identity.list_all().await?))
}

async fn manual_add_code(
    State(state): State<AppState>,
    Json(body): Json<ManualAddBody>,
) -> ApiResult<Json<Value>> {
    require_operator(&state, body.auth.as_deref())?;
    let (Ok(email), Ok(name)) = (
        required(body.email.as_deref(), "Missing name or email"),
        required(body.name.as_deref(), "Missing name or email"),
    ) else {
        return Err(ApiError::bad_request("Missing name or email"));
    };
    let (code, outcome) = state
        .identity
        .issue_code(name, email, body.code.as_deref(), body.is_admin)
        .await?;
    Ok(Json(
        json!({ "success": true, "code": code, "result": outcome }),
    ))
}
