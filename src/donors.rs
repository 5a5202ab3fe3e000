//! The identity store: donor records keyed by email.
//!
//! Every question of the form "is this person a donor" or "is this person an
//! admin" is answered here. Codes are opaque bearer credentials generated
//! once per email; re-registering an address never replaces its code.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::{self, DbPool},
    error::{StoreError, StoreResult},
    models::{Donor, NewDonor, Registration},
};

/// Generate a fresh unlock code.
#[must_use]
pub fn generate_code() -> String { Uuid::new_v4().to_string() }

fn require(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Donor persistence over a shared pool.
#[derive(Clone)]
pub struct IdentityStore {
    pool: DbPool,
}

impl IdentityStore {
    /// Wrap a pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self { Self { pool } }

    /// Register a donor.
    ///
    /// An unknown email is inserted. A known email is promoted in place when
    /// `is_admin` is set and the row is not yet an admin; otherwise nothing
    /// changes and the stored code stays authoritative.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for an empty name, email or code,
    /// or a pool/database error.
    pub async fn register_donor(
        &self,
        name: &str,
        email: &str,
        code: &str,
        is_admin: bool,
    ) -> StoreResult<Registration> {
        require("name", name)?;
        require("email", email)?;
        require("code", code)?;
        let mut conn = self.pool.get().await?;
        let donor = NewDonor {
            name,
            email,
            code,
            is_admin,
            created_at: Utc::now().naive_utc(),
        };
        let outcome = db::register_donor(&mut conn, &donor).await?;
        info!(%email, %outcome, is_admin, "donor registration");
        Ok(outcome)
    }

    /// Delete a donor, reporting whether a row existed.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn remove_donor(&self, email: &str) -> StoreResult<bool> {
        let mut conn = self.pool.get().await?;
        let removed = db::delete_donor(&mut conn, email).await? > 0;
        if removed {
            info!(%email, "donor removed");
        }
        Ok(removed)
    }

    /// The code stored for an email, if the email is known.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn lookup_code(&self, email: &str) -> StoreResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        Ok(db::code_for_email(&mut conn, email).await?)
    }

    /// Whether any donor holds `code`, whoever it belongs to.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn code_exists(&self, code: &str) -> StoreResult<bool> {
        if code.is_empty() {
            return Ok(false);
        }
        let mut conn = self.pool.get().await?;
        Ok(db::code_exists(&mut conn, code).await?)
    }

    /// Whether `code` is the code stored for `email`.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn code_matches_email(&self, email: &str, code: &str) -> StoreResult<bool> {
        Ok(self.admin_flag(email, code).await?.is_some())
    }

    /// Whether the pair identifies a donor holding the admin flag.
    ///
    /// Unknown emails, mismatched codes and non-admin donors all yield
    /// `false`.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn is_admin_principal(&self, email: &str, code: &str) -> StoreResult<bool> {
        Ok(self.admin_flag(email, code).await? == Some(true))
    }

    /// Admin flag of the donor matching both values; `None` when the pair
    /// does not match.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn admin_flag(&self, email: &str, code: &str) -> StoreResult<Option<bool>> {
        if email.is_empty() || code.is_empty() {
            debug!("credential check with an empty email or code");
            return Ok(None);
        }
        let mut conn = self.pool.get().await?;
        Ok(db::admin_flag_for(&mut conn, email, code).await?)
    }

    /// Every donor, newest first.
    ///
    /// # Errors
    /// Returns a pool or database error.
    pub async fn list_all(&self) -> StoreResult<Vec<Donor>> {
        let mut conn = self.pool.get().await?;
        Ok(db::list_donors(&mut conn).await?)
    }

    /// Make sure a paying supporter has a code.
    ///
    /// Returns the existing code with `false` for a known email, or a newly
    /// generated and registered code with `true`.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for an empty name or email, or a
    /// pool/database error.
    pub async fn onboard(&self, name: &str, email: &str) -> StoreResult<(String, bool)> {
        require("name", name)?;
        require("email", email)?;
        if let Some(code) = self.lookup_code(email).await? {
            return Ok((code, false));
        }
        let code = generate_code();
        match self.register_donor(name, email, &code, false).await? {
            Registration::Inserted => Ok((code, true)),
            // lost a race with another onboarding of the same address
            Registration::Updated | Registration::Exists => {
                let stored = self
                    .lookup_code(email)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("donor {email}")))?;
                Ok((stored, false))
            }
        }
    }

    /// Register a donor with a supplied or generated code.
    ///
    /// The returned code is the one stored after the call, which for an
    /// already known email is the original code rather than `code`.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for an empty name or email, or a
    /// pool/database error.
    pub async fn issue_code(
        &self,
        name: &str,
        email: &str,
        code: Option<&str>,
        is_admin: bool,
    ) -> StoreResult<(String, Registration)> {
        let candidate = match code.map(str::trim) {
            Some(supplied) if !supplied.is_empty() => supplied.to_owned(),
            _ => generate_code(),
        };
        let outcome = self
            .register_donor(name, email, &candidate, is_admin)
            .await?;
        if outcome == Registration::Inserted {
            return Ok((candidate, outcome));
        }
        let stored = self
            .lookup_code(email)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("donor {email}")))?;
        Ok((stored, outcome))
    }
}
