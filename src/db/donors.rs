//! Donor record helpers.

use diesel::{
    dsl::exists,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError, QueryResult},
    select,
};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{Donor, NewDonor, Registration};

/// Look up a donor by email address.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn find_donor_by_email(
    conn: &mut DbConnection,
    address: &str,
) -> QueryResult<Option<Donor>> {
    use crate::schema::donors::dsl::{donors, email};
    donors
        .filter(email.eq(address))
        .first::<Donor>(conn)
        .await
        .optional()
}

/// Insert a donor, or promote an existing one when admin rights are asked
/// for and not yet held.
///
/// A concurrent insert for the same email surfaces as a unique violation;
/// the row that won is then reconciled as if it had been there all along.
///
/// # Errors
/// Returns any error produced by the lookup, insert or update statements.
#[must_use = "handle the result"]
pub async fn register_donor(
    conn: &mut DbConnection,
    donor: &NewDonor<'_>,
) -> QueryResult<Registration> {
    use crate::schema::donors::dsl::donors;

    if let Some(existing) = find_donor_by_email(conn, donor.email).await? {
        return reconcile(conn, &existing, donor.is_admin).await;
    }
    match diesel::insert_into(donors)
        .values(donor)
        .execute(conn)
        .await
    {
        Ok(_) => Ok(Registration::Inserted),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            let Some(existing) = find_donor_by_email(conn, donor.email).await? else {
                return Err(DieselError::NotFound);
            };
            reconcile(conn, &existing, donor.is_admin).await
        }
        Err(e) => Err(e),
    }
}

async fn reconcile(
    conn: &mut DbConnection,
    existing: &Donor,
    wants_admin: bool,
) -> QueryResult<Registration> {
    if wants_admin && !existing.is_admin {
        promote_donor(conn, &existing.email).await?;
        Ok(Registration::Updated)
    } else {
        Ok(Registration::Exists)
    }
}

/// Set the admin flag on the donor with the given email.
///
/// # Errors
/// Returns any error produced by the update statement.
#[must_use = "handle the result"]
pub async fn promote_donor(conn: &mut DbConnection, address: &str) -> QueryResult<usize> {
    use crate::schema::donors::dsl::{donors, email, is_admin};
    diesel::update(donors.filter(email.eq(address)))
        .set(is_admin.eq(true))
        .execute(conn)
        .await
}

/// Delete the donor with the given email, returning the number of rows
/// removed.
///
/// # Errors
/// Returns any error produced by the delete statement.
#[must_use = "handle the result"]
pub async fn delete_donor(conn: &mut DbConnection, address: &str) -> QueryResult<usize> {
    use crate::schema::donors::dsl::{donors, email};
    diesel::delete(donors.filter(email.eq(address)))
        .execute(conn)
        .await
}

/// Fetch the unlock code stored for an email.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn code_for_email(conn: &mut DbConnection, address: &str) -> QueryResult<Option<String>> {
    use crate::schema::donors::dsl::{code, donors, email};
    donors
        .filter(email.eq(address))
        .select(code)
        .first::<String>(conn)
        .await
        .optional()
}

/// Whether any donor holds the given code.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn code_exists(conn: &mut DbConnection, candidate: &str) -> QueryResult<bool> {
    use crate::schema::donors::dsl::{code, donors};
    select(exists(donors.filter(code.eq(candidate))))
        .get_result(conn)
        .await
}

/// Admin flag of the donor matching both email and code, if any.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn admin_flag_for(
    conn: &mut DbConnection,
    address: &str,
    candidate: &str,
) -> QueryResult<Option<bool>> {
    use crate::schema::donors::dsl::{code, donors, email, is_admin};
    donors
        .filter(email.eq(address).and(code.eq(candidate)))
        .select(is_admin)
        .first::<bool>(conn)
        .await
        .optional()
}

/// List every donor, newest first.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_donors(conn: &mut DbConnection) -> QueryResult<Vec<Donor>> {
    use crate::schema::donors::dsl::{created_at, donors, id};
    donors
        .order((created_at.desc(), id.desc()))
        .load::<Donor>(conn)
        .await
}
