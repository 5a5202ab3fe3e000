//! JSON API consumed by the browser extension.
//!
//! Routes map one-to-one onto core operations. Administrative and mutating
//! routes require the operator secret, sent as `auth` in the JSON body or the
//! query string. Every origin may call the API.

mod announcements;
mod donors;
mod error;
mod insults;
mod params;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, Method},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use self::{
    donors::Verification,
    error::{ApiError, ApiResult},
    params::{lenient_flag, lenient_id},
};
use crate::{
    access::OperatorSecret,
    announcements::AnnouncementBoard,
    db::DbPool,
    donors::IdentityStore,
    insults::ModerationEngine,
    notify::CodeNotifier,
};

/// Body returned by the health check.
pub const HEALTH_TEXT: &str = "Snippy Server is running!";

/// Handles shared by every route.
#[derive(Clone)]
pub struct AppState {
    /// Donor records.
    pub identity: IdentityStore,
    /// Insult workflow.
    pub moderation: ModerationEngine,
    /// Announcement records.
    pub announcements: AnnouncementBoard,
    /// Unlock code delivery.
    pub notifier: Arc<dyn CodeNotifier>,
    /// Operator shared secret.
    pub operator: OperatorSecret,
}

impl AppState {
    /// Build every handle over one pool.
    #[must_use]
    pub fn new(pool: DbPool, operator: OperatorSecret, notifier: Arc<dyn CodeNotifier>) -> Self {
        Self {
            identity: IdentityStore::new(pool.clone()),
            moderation: ModerationEngine::new(pool.clone()),
            announcements: AnnouncementBoard::new(pool),
            notifier,
            operator,
        }
    }
}

async fn health() -> &'static str { HEALTH_TEXT }

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static("auth"),
        ])
}

/// Assemble the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(donors::router())
        .merge(insults::router())
        .merge(announcements::router());
    Router::new()
        .route("/", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}
