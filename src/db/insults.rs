//! Insult record helpers.

use diesel::{
    declare_sql_function,
    dsl::sql,
    prelude::*,
    result::QueryResult,
    sql_types::{Integer, Text},
};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{Insult, InsultStatus, NewInsult};

#[declare_sql_function]
extern "SQL" {
    fn lower(x: Text) -> Text;
    fn trim(x: Text) -> Text;
}

/// Columns read for the public pool: id, text, submitter name, whether the
/// name may be shown, click count and submission time.
pub type ApprovedRow = (
    i32,
    String,
    Option<String>,
    bool,
    i32,
    chrono::NaiveDateTime,
);

/// Find any stored insult whose trimmed, lowercased text equals the
/// candidate's, whatever its status.
///
/// Case folding is the backend's `lower`: `SQLite` folds ASCII letters only,
/// so `"ÉCLAIR"` and `"éclair"` are distinct there, while Postgres folds the
/// full Unicode range and treats them as duplicates.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn find_duplicate(conn: &mut DbConnection, candidate: &str) -> QueryResult<Option<i32>> {
    use crate::schema::insults::dsl::{id, insults, text};
    insults
        .filter(lower(trim(text)).eq(lower(trim(candidate))))
        .select(id)
        .first::<i32>(conn)
        .await
        .optional()
}

/// Insert an insult and return its id.
///
/// # Errors
/// Returns any error produced by the insertion query.
#[must_use = "handle the result"]
pub async fn insert_insult(conn: &mut DbConnection, insult: &NewInsult<'_>) -> QueryResult<i32> {
    use crate::schema::insults::dsl::{id, insults};
    diesel::insert_into(insults)
        .values(insult)
        .returning(id)
        .get_result(conn)
        .await
}

/// Fetch a single insult by id.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn get_insult(conn: &mut DbConnection, insult_id: i32) -> QueryResult<Option<Insult>> {
    use crate::schema::insults::dsl::insults;
    insults
        .find(insult_id)
        .first::<Insult>(conn)
        .await
        .optional()
}

/// Every insult submitted under an email, newest first.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_insults_by_email(
    conn: &mut DbConnection,
    address: &str,
) -> QueryResult<Vec<Insult>> {
    use crate::schema::insults::dsl::{created_at, id, insults, submitted_by_email};
    insults
        .filter(submitted_by_email.eq(address))
        .order((created_at.desc(), id.desc()))
        .load::<Insult>(conn)
        .await
}

/// Every insult in the given moderation state, newest first.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_insults_by_status(
    conn: &mut DbConnection,
    wanted: InsultStatus,
) -> QueryResult<Vec<Insult>> {
    use crate::schema::insults::dsl::{created_at, id, insults, status};
    insults
        .filter(status.eq(wanted))
        .order((created_at.desc(), id.desc()))
        .load::<Insult>(conn)
        .await
}

/// Mark an insult approved by `approver`, clearing any rejection reason.
///
/// # Errors
/// Returns any error produced by the update statement.
#[must_use = "handle the result"]
pub async fn approve_insult(
    conn: &mut DbConnection,
    insult_id: i32,
    approver: &str,
) -> QueryResult<usize> {
    use crate::schema::insults::dsl::{approved_by_email, insults, rejection_reason, status};
    diesel::update(insults.find(insult_id))
        .set((
            status.eq(InsultStatus::Approved),
            approved_by_email.eq(Some(approver)),
            rejection_reason.eq(None::<&str>),
        ))
        .execute(conn)
        .await
}

/// Mark an insult rejected with `reason`, clearing any approver.
///
/// # Errors
/// Returns any error produced by the update statement.
#[must_use = "handle the result"]
pub async fn reject_insult(
    conn: &mut DbConnection,
    insult_id: i32,
    reason: &str,
) -> QueryResult<usize> {
    use crate::schema::insults::dsl::{approved_by_email, insults, rejection_reason, status};
    diesel::update(insults.find(insult_id))
        .set((
            status.eq(InsultStatus::Rejected),
            rejection_reason.eq(Some(reason)),
            approved_by_email.eq(None::<&str>),
        ))
        .execute(conn)
        .await
}

/// Delete an insult, returning the number of rows removed.
///
/// # Errors
/// Returns any error produced by the delete statement.
#[must_use = "handle the result"]
pub async fn delete_insult(conn: &mut DbConnection, insult_id: i32) -> QueryResult<usize> {
    use crate::schema::insults::dsl::insults;
    diesel::delete(insults.find(insult_id)).execute(conn).await
}

/// Add one to an insult's click counter.
///
/// # Errors
/// Returns any error produced by the update statement.
#[must_use = "handle the result"]
pub async fn increment_click_count(conn: &mut DbConnection, insult_id: i32) -> QueryResult<usize> {
    use crate::schema::insults::dsl::{click_count, insults};
    diesel::update(insults.find(insult_id))
        .set(click_count.eq(click_count + 1))
        .execute(conn)
        .await
}

/// Up to `limit` approved insults in an order the database shuffles on every
/// call.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_approved_random(
    conn: &mut DbConnection,
    limit: i64,
) -> QueryResult<Vec<ApprovedRow>> {
    use crate::schema::insults::dsl::{
        click_count,
        created_at,
        id,
        insults,
        show_name,
        status,
        submitted_by_name,
        text,
    };
    insults
        .filter(status.eq(InsultStatus::Approved))
        .select((
            id,
            text,
            submitted_by_name,
            show_name,
            click_count,
            created_at,
        ))
        .order(sql::<Integer>("RANDOM()"))
        .limit(limit)
        .load::<ApprovedRow>(conn)
        .await
}
