//! Announcement record helpers.

use chrono::NaiveDateTime;
use diesel::{prelude::*, result::QueryResult};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{Announcement, AnnouncementChanges, NewAnnouncement};

/// Insert an announcement and return its id.
///
/// # Errors
/// Returns any error produced by the insertion query.
#[must_use = "handle the result"]
pub async fn create_announcement(
    conn: &mut DbConnection,
    announcement: &NewAnnouncement<'_>,
) -> QueryResult<i32> {
    use crate::schema::announcements::dsl::{announcements, id};
    diesel::insert_into(announcements)
        .values(announcement)
        .returning(id)
        .get_result(conn)
        .await
}

/// Announcements whose window contains `now`, latest start first.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_active_announcements(
    conn: &mut DbConnection,
    now: NaiveDateTime,
) -> QueryResult<Vec<Announcement>> {
    use crate::schema::announcements::dsl::{announcements, ends_at, id, starts_at};
    announcements
        .filter(starts_at.le(now).and(ends_at.ge(now)))
        .order((starts_at.desc(), id.desc()))
        .load::<Announcement>(conn)
        .await
}

/// Every announcement, newest first.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_announcements(conn: &mut DbConnection) -> QueryResult<Vec<Announcement>> {
    use crate::schema::announcements::dsl::{announcements, created_at, id};
    announcements
        .order((created_at.desc(), id.desc()))
        .load::<Announcement>(conn)
        .await
}

/// Overwrite the editable fields of an announcement.
///
/// # Errors
/// Returns any error produced by the update statement.
#[must_use = "handle the result"]
pub async fn update_announcement(
    conn: &mut DbConnection,
    announcement_id: i32,
    changes: &AnnouncementChanges<'_>,
) -> QueryResult<usize> {
    use crate::schema::announcements::dsl::announcements;
    diesel::update(announcements.find(announcement_id))
        .set(changes)
        .execute(conn)
        .await
}

/// Delete one announcement, returning the number of rows removed.
///
/// # Errors
/// Returns any error produced by the delete statement.
#[must_use = "handle the result"]
pub async fn delete_announcement(
    conn: &mut DbConnection,
    announcement_id: i32,
) -> QueryResult<usize> {
    use crate::schema::announcements::dsl::announcements;
    diesel::delete(announcements.find(announcement_id))
        .execute(conn)
        .await
}

/// Delete every announcement, returning the number of rows removed.
///
/// # Errors
/// Returns any error produced by the delete statement.
#[must_use = "handle the result"]
pub async fn delete_all_announcements(conn: &mut DbConnection) -> QueryResult<usize> {
    use crate::schema::announcements::dsl::announcements;
    diesel::delete(announcements).execute(conn).await
}
