//! Authorization predicates.
//!
//! Two independent capabilities exist. A donor proves identity with an
//! email and unlock code pair, optionally carrying the admin flag. The
//! operator holds a configured shared secret that is not tied to any donor
//! and gates the administrative routes.

use std::fmt;

use bitflags::bitflags;
use subtle::ConstantTimeEq;

use crate::{donors::IdentityStore, error::StoreResult};

bitflags! {
    /// Capabilities held by an authenticated caller.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Holds a valid email and code pair.
        const DONOR = 1 << 0;
        /// Donor whose record carries the admin flag.
        const DONOR_ADMIN = 1 << 1;
        /// Presented the operator shared secret.
        const OPERATOR = 1 << 2;
    }
}

impl Capabilities {
    /// Capabilities implied by a matching donor record.
    #[must_use]
    pub const fn for_donor(is_admin: bool) -> Self {
        if is_admin {
            Self::DONOR.union(Self::DONOR_ADMIN)
        } else {
            Self::DONOR
        }
    }
}

/// An authenticated donor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Email the code was matched against.
    pub email: String,
    /// What the donor may do.
    pub capabilities: Capabilities,
}

impl Principal {
    /// Whether the donor record carries the admin flag.
    #[must_use]
    pub const fn is_admin(&self) -> bool { self.capabilities.contains(Capabilities::DONOR_ADMIN) }
}

/// Authenticate an email and code pair against the identity store.
///
/// Returns `None` when the pair does not match a stored donor.
///
/// # Errors
/// Returns a pool or database error from the lookup.
pub async fn authenticate(
    store: &IdentityStore,
    email: &str,
    code: &str,
) -> StoreResult<Option<Principal>> {
    Ok(store
        .admin_flag(email, code)
        .await?
        .map(|is_admin| Principal {
            email: email.to_owned(),
            capabilities: Capabilities::for_donor(is_admin),
        }))
}

/// The operator shared secret.
///
/// An unset or empty secret matches nothing, leaving every operator route
/// closed.
#[derive(Clone, Default)]
pub struct OperatorSecret(Option<String>);

impl OperatorSecret {
    /// Wrap the configured secret.
    #[must_use]
    pub fn new(secret: Option<String>) -> Self { Self(secret.filter(|s| !s.is_empty())) }

    /// Whether a secret is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool { self.0.is_some() }

    /// Compare a presented value in constant time.
    #[must_use]
    pub fn verify(&self, presented: Option<&str>) -> bool {
        match (&self.0, presented) {
            (Some(expected), Some(given)) => expected.as_bytes().ct_eq(given.as_bytes()).into(),
            _ => false,
        }
    }

    /// Capability granted for a presented value.
    #[must_use]
    pub fn capabilities(&self, presented: Option<&str>) -> Capabilities {
        if self.verify(presented) {
            Capabilities::OPERATOR
        } else {
            Capabilities::empty()
        }
    }
}

impl fmt::Debug for OperatorSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.is_configured() { "<redacted>" } else { "<unset>" };
        f.debug_tuple("OperatorSecret").field(&shown).finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Some("s3cret"), Some("s3cret"), true)]
    #[case(Some("s3cret"), Some("s3cre"), false)]
    #[case(Some("s3cret"), Some("S3CRET"), false)]
    #[case(Some("s3cret"), None, false)]
    #[case(None, Some(""), false)]
    #[case(Some(""), Some(""), false)]
    #[case(None, None, false)]
    fn operator_secret_fails_closed(
        #[case] configured: Option<&str>,
        #[case] presented: Option<&str>,
        #[case] expected: bool,
    ) {
        let secret = OperatorSecret::new(configured.map(str::to_owned));
        assert_eq!(secret.verify(presented), expected);
    }

    #[test]
    fn debug_output_hides_secret() {
        let secret = OperatorSecret::new(Some("hunter2".to_owned()));
        let shown = format!("{secret:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("redacted"));
    }

    #[rstest]
    #[case(false, Capabilities::DONOR)]
    #[case(true, Capabilities::DONOR | Capabilities::DONOR_ADMIN)]
    fn donor_capabilities(#[case] is_admin: bool, #[case] expected: Capabilities) {
        let caps = Capabilities::for_donor(is_admin);
        assert_eq!(caps, expected);
        assert!(!caps.contains(Capabilities::OPERATOR));
    }

    #[test]
    fn operator_capability_is_separate() {
        let secret = OperatorSecret::new(Some("k".to_owned()));
        assert_eq!(secret.capabilities(Some("k")), Capabilities::OPERATOR);
        assert!(secret.capabilities(Some("x")).is_empty());
    }
}
