//! Identity store and authorization behaviour against a migrated database.

mod common;

use common::{TestDb, migrated_db};
use rstest::{fixture, rstest};
use snippy::{
    access::{Capabilities, authenticate},
    donors::IdentityStore,
    error::StoreError,
    models::Registration,
};

#[fixture]
async fn db() -> TestDb { migrated_db().await }

fn store(db: &TestDb) -> IdentityStore { IdentityStore::new(db.pool.clone()) }

#[rstest]
#[tokio::test]
async fn registering_twice_keeps_the_first_code(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);

    let first = store
        .register_donor("Dana", "dana@example.com", "code-1", false)
        .await
        .expect("register");
    let second = store
        .register_donor("Dana Again", "dana@example.com", "code-2", false)
        .await
        .expect("register again");

    assert_eq!(first, Registration::Inserted);
    assert_eq!(second, Registration::Exists);
    assert_eq!(
        store
            .lookup_code("dana@example.com")
            .await
            .expect("lookup")
            .as_deref(),
        Some("code-1")
    );
    assert_eq!(store.list_all().await.expect("list").len(), 1);
}

#[rstest]
#[tokio::test]
async fn admin_registration_promotes_without_changing_code(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);
    store
        .register_donor("Ada", "ada@example.com", "ada-code", false)
        .await
        .expect("register");

    let promoted = store
        .register_donor("Ada", "ada@example.com", "other", true)
        .await
        .expect("promote");
    let repeated = store
        .register_donor("Ada", "ada@example.com", "other", true)
        .await
        .expect("promote again");

    assert_eq!(promoted, Registration::Updated);
    assert_eq!(repeated, Registration::Exists);
    assert!(
        store
            .is_admin_principal("ada@example.com", "ada-code")
            .await
            .expect("check")
    );
    assert!(
        !store
            .is_admin_principal("ada@example.com", "other")
            .await
            .expect("check")
    );
}

#[rstest]
#[case("", "d@example.com", "code")]
#[case("Dana", "", "code")]
#[case("Dana", "d@example.com", "")]
#[tokio::test]
async fn registration_rejects_empty_fields(
    #[future] db: TestDb,
    #[case] name: &str,
    #[case] email: &str,
    #[case] code: &str,
) {
    let db = db.await;
    let err = store(&db)
        .register_donor(name, email, code, false)
        .await
        .expect_err("must reject");
    assert!(matches!(err, StoreError::Validation(_)));
}

#[rstest]
#[tokio::test]
async fn code_checks_distinguish_ownership(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);
    store
        .register_donor("Dana", "dana@example.com", "dana-code", false)
        .await
        .expect("register");
    store
        .register_donor("Eve", "eve@example.com", "eve-code", false)
        .await
        .expect("register");

    assert!(store.code_exists("eve-code").await.expect("exists"));
    assert!(!store.code_exists("nope").await.expect("exists"));
    assert!(!store.code_exists("").await.expect("exists"));
    assert!(
        store
            .code_matches_email("dana@example.com", "dana-code")
            .await
            .expect("match")
    );
    assert!(
        !store
            .code_matches_email("dana@example.com", "eve-code")
            .await
            .expect("match")
    );
    assert!(
        !store
            .code_matches_email("", "dana-code")
            .await
            .expect("match")
    );
}

#[rstest]
#[tokio::test]
async fn admin_check_fails_closed(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);
    store
        .register_donor("Dana", "dana@example.com", "dana-code", false)
        .await
        .expect("register");

    for (email, code) in [
        ("dana@example.com", "dana-code"),
        ("unknown@example.com", "dana-code"),
        ("dana@example.com", "wrong"),
        ("", ""),
    ] {
        assert!(
            !store.is_admin_principal(email, code).await.expect("check"),
            "{email}/{code} must not be admin"
        );
    }
}

#[rstest]
#[tokio::test]
async fn authenticate_assigns_capabilities(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);
    store
        .register_donor("Dana", "dana@example.com", "dana-code", false)
        .await
        .expect("register");
    store
        .register_donor("Ada", "ada@example.com", "ada-code", true)
        .await
        .expect("register");

    let donor = authenticate(&store, "dana@example.com", "dana-code")
        .await
        .expect("auth")
        .expect("principal");
    let admin = authenticate(&store, "ada@example.com", "ada-code")
        .await
        .expect("auth")
        .expect("principal");
    let nobody = authenticate(&store, "ada@example.com", "dana-code")
        .await
        .expect("auth");

    assert_eq!(donor.capabilities, Capabilities::DONOR);
    assert!(!donor.is_admin());
    assert!(admin.is_admin());
    assert!(!admin.capabilities.contains(Capabilities::OPERATOR));
    assert!(nobody.is_none());
}

#[rstest]
#[tokio::test]
async fn onboarding_generates_once(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);

    let (code, fresh) = store
        .onboard("Dana", "dana@example.com")
        .await
        .expect("onboard");
    let (again, fresh_again) = store
        .onboard("Dana", "dana@example.com")
        .await
        .expect("onboard again");

    assert!(fresh);
    assert!(!fresh_again);
    assert_eq!(code, again);
    assert!(store.code_exists(&code).await.expect("exists"));
}

#[rstest]
#[tokio::test]
async fn issuing_a_code_reports_the_stored_one(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);

    let (code, outcome) = store
        .issue_code("Dana", "dana@example.com", Some("chosen"), false)
        .await
        .expect("issue");
    let (again, again_outcome) = store
        .issue_code("Dana", "dana@example.com", Some("ignored"), true)
        .await
        .expect("issue again");
    let (generated, _) = store
        .issue_code("Eve", "eve@example.com", Some("   "), false)
        .await
        .expect("issue generated");

    assert_eq!((code.as_str(), outcome), ("chosen", Registration::Inserted));
    assert_eq!(
        (again.as_str(), again_outcome),
        ("chosen", Registration::Updated)
    );
    assert_eq!(generated.len(), 36);
}

#[rstest]
#[tokio::test]
async fn removal_reports_absence(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);
    store
        .register_donor("Dana", "dana@example.com", "dana-code", false)
        .await
        .expect("register");

    assert!(store.remove_donor("dana@example.com").await.expect("remove"));
    assert!(!store.remove_donor("dana@example.com").await.expect("remove"));
    assert!(!store.code_exists("dana-code").await.expect("exists"));
}

#[rstest]
#[tokio::test]
async fn listing_is_newest_first(#[future] db: TestDb) {
    let db = db.await;
    let store = store(&db);
    for (name, email) in [("A", "a@example.com"), ("B", "b@example.com")] {
        store
            .register_donor(name, email, &format!("{name}-code"), false)
            .await
            .expect("register");
    }

    let emails: Vec<_> = store
        .list_all()
        .await
        .expect("list")
        .into_iter()
        .map(|d| d.email)
        .collect();

    assert_eq!(emails, ["b@example.com", "a@example.com"]);
}
