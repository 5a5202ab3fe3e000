//! Time-boxed announcements.
//!
//! An announcement is visible while `starts_at <= now <= ends_at`. Bodies are
//! sanitized with the announcement allow-list, which adds list markup to the
//! insult tags.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::info;

use crate::{
    db::{self, DbPool},
    error::{StoreError, StoreResult},
    models::{Announcement, AnnouncementChanges, NewAnnouncement},
    sanitize::sanitize_announcement,
};

/// Category applied when none is given.
pub const DEFAULT_CATEGORY: &str = "What's New";

/// Which end of a window a timestamp bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowBound {
    /// Inclusive start; a bare date means midnight.
    Start,
    /// Inclusive end; a bare date means the last instant of that day.
    End,
}

/// Parse a window bound.
///
/// Accepts RFC 3339 timestamps (normalized to UTC), naive
/// `YYYY-MM-DDTHH:MM[:SS]` values read as UTC, and bare `YYYY-MM-DD` dates.
///
/// # Errors
/// Returns [`StoreError::Validation`] when the value matches none of the
/// accepted shapes.
pub fn parse_timestamp(raw: &str, bound: WindowBound) -> StoreResult<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| StoreError::validation(format!("unrecognised timestamp '{raw}'")))?;
    let time = match bound {
        WindowBound::Start => NaiveTime::MIN,
        WindowBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| StoreError::validation("end of day is not representable"))?,
    };
    Ok(date.and_time(time))
}

/// Editable announcement fields, shared by create and update.
#[derive(Debug, Clone, Copy)]
pub struct AnnouncementDraft<'a> {
    /// Headline.
    pub title: &'a str,
    /// Body markup, sanitized before storage.
    pub body: &'a str,
    /// Category label; [`DEFAULT_CATEGORY`] when absent or blank.
    pub category: Option<&'a str>,
    /// Inclusive window start.
    pub starts_at: NaiveDateTime,
    /// Inclusive window end.
    pub ends_at: NaiveDateTime,
}

impl AnnouncementDraft<'_> {
    fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation("title must not be empty"));
        }
        if self.body.trim().is_empty() {
            return Err(StoreError::validation("body must not be empty"));
        }
        if self.starts_at > self.ends_at {
            return Err(StoreError::validation("window starts after it ends"));
        }
        Ok(())
    }

    fn category(&self) -> &str {
        self.category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Announcement persistence over a shared pool.
#[derive(Clone)]
pub struct AnnouncementBoard {
    pool: DbPool,
}

impl AnnouncementBoard {
    /// Wrap a pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self { Self { pool } }

    /// Store a new announcement and return its id.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for a blank title or body or an
    /// inverted window, or a pool/database error.
    pub async fn create(
        &self,
        draft: &AnnouncementDraft<'_>,
        created_by: Option<&str>,
    ) -> StoreResult<i32> {
        draft.validate()?;
        let body = sanitize_announcement(draft.body);
        let mut conn = self.pool.get().await?;
        let id = db::create_announcement(
            &mut conn,
            &NewAnnouncement {
                title: draft.title,
                body: &body,
                category: draft.category(),
                starts_at: draft.starts_at,
                ends_at: draft.ends_at,
                created_by_email: created_by.filter(|e| !e.trim().is_empty()),
                created_at: Utc::now().naive_utc(),
            },
        )
        .await?;
        info!(id, title = draft.title, "announcement created");
        Ok(id)
    }

    /// Announcements visible at `now`, latest start first.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn list_active(&self, now: NaiveDateTime) -> StoreResult<Vec<Announcement>> {
        let mut conn = self.pool.get().await?;
        Ok(db::list_active_announcements(&mut conn, now).await?)
    }

    /// Every announcement, newest first.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn list_all(&self) -> StoreResult<Vec<Announcement>> {
        let mut conn = self.pool.get().await?;
        Ok(db::list_announcements(&mut conn).await?)
    }

    /// Replace every editable field of an announcement.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for a blank title or body or an
    /// inverted window, or a pool/database error.
    pub async fn update(&self, id: i32, draft: &AnnouncementDraft<'_>) -> StoreResult<bool> {
        draft.validate()?;
        let body = sanitize_announcement(draft.body);
        let mut conn = self.pool.get().await?;
        let changes = AnnouncementChanges {
            title: draft.title,
            body: &body,
            category: draft.category(),
            starts_at: draft.starts_at,
            ends_at: draft.ends_at,
        };
        let changed = db::update_announcement(&mut conn, id, &changes).await? > 0;
        info!(id, changed, "announcement updated");
        Ok(changed)
    }

    /// Delete one announcement.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.pool.get().await?;
        Ok(db::delete_announcement(&mut conn, id).await? > 0)
    }

    /// Delete every announcement, returning how many were removed.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn delete_all(&self) -> StoreResult<usize> {
        let mut conn = self.pool.get().await?;
        let removed = db::delete_all_announcements(&mut conn).await?;
        info!(removed, "all announcements deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").expect("fixture timestamp")
    }

    #[rstest]
    #[case("2025-06-01", WindowBound::Start, "2025-06-01 00:00:00")]
    #[case("2025-06-01", WindowBound::End, "2025-06-01 23:59:59.999")]
    #[case("2025-06-01T08:30", WindowBound::End, "2025-06-01 08:30:00")]
    #[case("2025-06-01T08:30:15.250", WindowBound::Start, "2025-06-01 08:30:15.250")]
    #[case("2025-06-01T10:00:00+02:00", WindowBound::Start, "2025-06-01 08:00:00")]
    #[case("2025-06-01T10:00:00Z", WindowBound::End, "2025-06-01 10:00:00")]
    #[case(" 2025-06-01 12:00:00 ", WindowBound::Start, "2025-06-01 12:00:00")]
    fn parses_window_bounds(#[case] raw: &str, #[case] bound: WindowBound, #[case] expected: &str) {
        assert_eq!(parse_timestamp(raw, bound).expect("parse"), ts(expected));
    }

    #[rstest]
    #[case("")]
    #[case("next tuesday")]
    #[case("2025-13-01")]
    fn rejects_unparseable_bounds(#[case] raw: &str) {
        assert!(matches!(
            parse_timestamp(raw, WindowBound::Start),
            Err(StoreError::Validation(_))
        ));
    }

    #[rstest]
    #[case(None, DEFAULT_CATEGORY)]
    #[case(Some("  "), DEFAULT_CATEGORY)]
    #[case(Some("Tips"), "Tips")]
    fn category_defaults(#[case] category: Option<&str>, #[case] expected: &str) {
        let draft = AnnouncementDraft {
            title: "t",
            body: "b",
            category,
            starts_at: ts("2025-01-01 00:00:00"),
            ends_at: ts("2025-01-02 00:00:00"),
        };
        assert_eq!(draft.category(), expected);
    }

    #[test]
    fn inverted_window_is_invalid() {
        let draft = AnnouncementDraft {
            title: "t",
            body: "b",
            category: None,
            starts_at: ts("2025-01-02 00:00:00"),
            ends_at: ts("2025-01-01 00:00:00"),
        };
        assert!(matches!(draft.validate(), Err(StoreError::Validation(_))));
    }
}
