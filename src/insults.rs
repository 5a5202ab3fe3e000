//! The insult moderation engine.
//!
//! Submissions are sanitized, checked for an exact duplicate (trimmed and
//! case-folded) against every stored insult, and queued as `pending` or
//! recorded as `rejected_duplicate`. Moderators move pending insults to
//! `approved` or `rejected`; approved insults form the public pool.
//!
//! The duplicate check and the insert are separate statements, so two
//! identical submissions arriving together can both be queued as pending.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    db::{self, ApprovedRow, DbPool},
    error::{StoreError, StoreResult},
    models::{Insult, InsultStatus, NewInsult, PublicInsult},
    sanitize::sanitize_insult,
};

/// Reason stored on automatically rejected duplicates.
pub const DUPLICATE_REASON: &str = "This insult was already submitted.";
/// Reason stored when a moderator rejects without giving one.
pub const DEFAULT_REJECT_REASON: &str = "Rejected by moderator.";
/// Submitter name used for insults published by an operator.
pub const BOT_NAME: &str = "Snippy";
/// Submitter and approver email used for insults published by an operator.
pub const BOT_EMAIL: &str = "snippybot@snippyforquickbase.com";
/// Display name shown when the submitter chose not to be named.
pub const ANONYMOUS: &str = "Anonymous";
/// Largest page the public pool returns.
pub const MAX_POOL_SIZE: u32 = 100;

/// How a new insult entered the store.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Queued for moderation.
    Pending,
    /// Recorded as a duplicate of an earlier insult.
    Duplicate,
    /// Published directly by an operator.
    Approved,
}

/// Result of a submission or operator insert.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    /// Outcome of the write.
    pub status: SubmissionStatus,
    /// Id of the stored row.
    pub id: i32,
}

/// Name shown publicly for an approved insult.
#[must_use]
pub fn display_name(submitted_by_name: Option<&str>, show_name: bool) -> String {
    match submitted_by_name.map(str::trim) {
        Some(name) if show_name && !name.is_empty() => name.to_owned(),
        _ => ANONYMOUS.to_owned(),
    }
}

fn to_public((id, text, name, show_name, click_count, created_at): ApprovedRow) -> PublicInsult {
    PublicInsult {
        id,
        text,
        display_name: display_name(name.as_deref(), show_name),
        click_count,
        created_at,
    }
}

/// Moderation workflow over a shared pool.
#[derive(Clone)]
pub struct ModerationEngine {
    pool: DbPool,
}

impl ModerationEngine {
    /// Wrap a pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self { Self { pool } }

    /// Submit an insult for moderation.
    ///
    /// The text is sanitized before the duplicate check and before storage,
    /// whichever branch is taken.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] when the text is empty after
    /// sanitizing or the email is empty, or a pool/database error.
    pub async fn submit(
        &self,
        text: &str,
        name: Option<&str>,
        email: &str,
        show_name: bool,
    ) -> StoreResult<Submission> {
        let safe = sanitize_insult(text);
        if safe.trim().is_empty() {
            return Err(StoreError::validation("insult text must not be empty"));
        }
        if email.trim().is_empty() {
            return Err(StoreError::validation("submitter email must not be empty"));
        }
        let mut conn = self.pool.get().await?;
        let (status, stored, reason) = if db::find_duplicate(&mut conn, &safe).await?.is_some() {
            (
                InsultStatus::RejectedDuplicate,
                SubmissionStatus::Duplicate,
                Some(DUPLICATE_REASON),
            )
        } else {
            (InsultStatus::Pending, SubmissionStatus::Pending, None)
        };
        let insult = NewInsult {
            text: &safe,
            submitted_by_name: name.filter(|n| !n.trim().is_empty()),
            submitted_by_email: email,
            show_name,
            status,
            rejection_reason: reason,
            approved_by_email: None,
            created_at: Utc::now().naive_utc(),
        };
        let id = db::insert_insult(&mut conn, &insult).await?;
        info!(id, %email, status = %status, "insult submitted");
        Ok(Submission { status: stored, id })
    }

    /// Every insult submitted under `email`, newest first.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn list_by_email(&self, email: &str) -> StoreResult<Vec<Insult>> {
        let mut conn = self.pool.get().await?;
        Ok(db::list_insults_by_email(&mut conn, email).await?)
    }

    /// Every insult in `status`, newest first.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn list_by_status(&self, status: InsultStatus) -> StoreResult<Vec<Insult>> {
        let mut conn = self.pool.get().await?;
        Ok(db::list_insults_by_status(&mut conn, status).await?)
    }

    /// Approve an insult whatever its current state.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for an empty approver, or a
    /// pool/database error.
    pub async fn approve(&self, id: i32, approver_email: &str) -> StoreResult<bool> {
        if approver_email.trim().is_empty() {
            return Err(StoreError::validation("approver email must not be empty"));
        }
        let mut conn = self.pool.get().await?;
        let changed = db::approve_insult(&mut conn, id, approver_email).await? > 0;
        info!(id, approver = %approver_email, changed, "insult approved");
        Ok(changed)
    }

    /// Reject an insult, storing [`DEFAULT_REJECT_REASON`] when no reason is
    /// given.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn reject(&self, id: i32, reason: Option<&str>) -> StoreResult<bool> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECT_REASON);
        let mut conn = self.pool.get().await?;
        let changed = db::reject_insult(&mut conn, id, reason).await? > 0;
        info!(id, %reason, changed, "insult rejected");
        Ok(changed)
    }

    /// Delete an insult at any stage.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.pool.get().await?;
        let removed = db::delete_insult(&mut conn, id).await? > 0;
        info!(id, removed, "insult deleted");
        Ok(removed)
    }

    /// Count a click on an insult.
    ///
    /// Succeeds whenever the statement runs, including for unknown ids.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn increment_click(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.pool.get().await?;
        let rows = db::increment_click_count(&mut conn, id).await?;
        debug!(id, rows, "insult click recorded");
        Ok(true)
    }

    /// Publish an insult directly under the bot identity, skipping the
    /// duplicate check.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] when the text is empty after
    /// sanitizing, or a pool/database error.
    pub async fn insert_approved(&self, text: &str) -> StoreResult<Submission> {
        let safe = sanitize_insult(text);
        if safe.trim().is_empty() {
            return Err(StoreError::validation("insult text must not be empty"));
        }
        let mut conn = self.pool.get().await?;
        let insult = NewInsult {
            text: &safe,
            submitted_by_name: Some(BOT_NAME),
            submitted_by_email: BOT_EMAIL,
            show_name: true,
            status: InsultStatus::Approved,
            rejection_reason: None,
            approved_by_email: Some(BOT_EMAIL),
            created_at: Utc::now().naive_utc(),
        };
        let id = db::insert_insult(&mut conn, &insult).await?;
        info!(id, "insult published by operator");
        Ok(Submission {
            status: SubmissionStatus::Approved,
            id,
        })
    }

    /// A random selection of approved insults with anonymized names.
    ///
    /// `limit` is clamped to `1..=100` and defaults to 100.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn list_approved_random(&self, limit: Option<u32>) -> StoreResult<Vec<PublicInsult>> {
        let limit = limit.unwrap_or(MAX_POOL_SIZE).clamp(1, MAX_POOL_SIZE);
        let mut conn = self.pool.get().await?;
        let rows = db::list_approved_random(&mut conn, i64::from(limit)).await?;
        Ok(rows.into_iter().map(to_public).collect())
    }
}
