use chrono::{NaiveDate, NaiveDateTime};
use diesel_async::AsyncConnection;
#[cfg(feature = "sqlite")]
use rstest::{fixture, rstest};

use super::*;
#[cfg(feature = "sqlite")]
use crate::models::{AnnouncementChanges, InsultStatus, NewAnnouncement, NewDonor, NewInsult, Registration};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid timestamp")
}

#[cfg(feature = "sqlite")]
#[fixture]
async fn migrated_conn() -> DbConnection {
    let mut conn = DbConnection::establish(":memory:")
        .await
        .expect("failed to create in-memory connection");
    apply_migrations(&mut conn, "")
        .await
        .expect("failed to apply migrations");
    conn
}

#[cfg(feature = "sqlite")]
fn donor<'a>(email: &'a str, code: &'a str, is_admin: bool, day: u32) -> NewDonor<'a> {
    NewDonor {
        name: "Dana",
        email,
        code,
        is_admin,
        created_at: at(day, 12),
    }
}

#[cfg(feature = "sqlite")]
fn pending<'a>(text: &'a str, email: &'a str) -> NewInsult<'a> {
    NewInsult {
        text,
        submitted_by_name: None,
        submitted_by_email: email,
        show_name: false,
        status: InsultStatus::Pending,
        rejection_reason: None,
        approved_by_email: None,
        created_at: at(1, 9),
    }
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_register_donor_is_idempotent(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    let first = register_donor(&mut conn, &donor("d@example.com", "c1", false, 1))
        .await
        .expect("first registration");
    let second = register_donor(&mut conn, &donor("d@example.com", "c2", false, 2))
        .await
        .expect("second registration");
    assert_eq!(first, Registration::Inserted);
    assert_eq!(second, Registration::Exists);
    let code = code_for_email(&mut conn, "d@example.com")
        .await
        .expect("lookup");
    assert_eq!(code.as_deref(), Some("c1"));
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_register_donor_promotes_once(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    register_donor(&mut conn, &donor("a@example.com", "c1", false, 1))
        .await
        .expect("insert");
    let promoted = register_donor(&mut conn, &donor("a@example.com", "c1", true, 1))
        .await
        .expect("promote");
    let again = register_donor(&mut conn, &donor("a@example.com", "c1", true, 1))
        .await
        .expect("repeat");
    assert_eq!(promoted, Registration::Updated);
    assert_eq!(again, Registration::Exists);
    let flag = admin_flag_for(&mut conn, "a@example.com", "c1")
        .await
        .expect("flag");
    assert_eq!(flag, Some(true));
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_code_queries(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    register_donor(&mut conn, &donor("b@example.com", "code-b", false, 1))
        .await
        .expect("insert");
    assert!(code_exists(&mut conn, "code-b").await.expect("exists"));
    assert!(!code_exists(&mut conn, "code-x").await.expect("exists"));
    assert_eq!(
        admin_flag_for(&mut conn, "b@example.com", "code-x")
            .await
            .expect("flag"),
        None
    );
    assert_eq!(
        admin_flag_for(&mut conn, "b@example.com", "code-b")
            .await
            .expect("flag"),
        Some(false)
    );
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_list_and_delete_donors(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    register_donor(&mut conn, &donor("old@example.com", "c1", false, 1))
        .await
        .expect("insert");
    register_donor(&mut conn, &donor("new@example.com", "c2", false, 5))
        .await
        .expect("insert");
    let emails: Vec<String> = list_donors(&mut conn)
        .await
        .expect("list")
        .into_iter()
        .map(|d| d.email)
        .collect();
    assert_eq!(emails, ["new@example.com", "old@example.com"]);
    assert_eq!(
        delete_donor(&mut conn, "old@example.com")
            .await
            .expect("delete"),
        1
    );
    assert_eq!(
        delete_donor(&mut conn, "old@example.com")
            .await
            .expect("delete"),
        0
    );
}

#[cfg(feature = "sqlite")]
#[rstest]
#[case("Smells of elderberries", "  smells OF elderberries ")]
#[case("<b>Loud</b>", "<B>LOUD</B>")]
#[tokio::test]
async fn test_find_duplicate_ignores_case_and_padding(
    #[future] migrated_conn: DbConnection,
    #[case] stored: &str,
    #[case] candidate: &str,
) {
    let mut conn = migrated_conn.await;
    let id = insert_insult(&mut conn, &pending(stored, "s@example.com"))
        .await
        .expect("insert");
    let found = find_duplicate(&mut conn, candidate).await.expect("lookup");
    assert_eq!(found, Some(id));
    assert_eq!(
        find_duplicate(&mut conn, "something else")
            .await
            .expect("lookup"),
        None
    );
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_moderation_updates_keep_columns_consistent(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    let id = insert_insult(&mut conn, &pending("Mostly harmless", "s@example.com"))
        .await
        .expect("insert");

    reject_insult(&mut conn, id, "too mild").await.expect("reject");
    let rejected = get_insult(&mut conn, id).await.expect("get").expect("row");
    assert_eq!(rejected.status, InsultStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("too mild"));
    assert_eq!(rejected.approved_by_email, None);

    approve_insult(&mut conn, id, "mod@example.com")
        .await
        .expect("approve");
    let approved = get_insult(&mut conn, id).await.expect("get").expect("row");
    assert_eq!(approved.status, InsultStatus::Approved);
    assert_eq!(approved.rejection_reason, None);
    assert_eq!(approved.approved_by_email.as_deref(), Some("mod@example.com"));

    let by_status = list_insults_by_status(&mut conn, InsultStatus::Approved)
        .await
        .expect("list");
    assert_eq!(by_status.len(), 1);
    let mine = list_insults_by_email(&mut conn, "s@example.com")
        .await
        .expect("list");
    assert_eq!(mine.len(), 1);
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_click_count_and_random_pool(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    let approved = insert_insult(&mut conn, &pending("Approved one", "s@example.com"))
        .await
        .expect("insert");
    insert_insult(&mut conn, &pending("Still pending", "s@example.com"))
        .await
        .expect("insert");
    approve_insult(&mut conn, approved, "mod@example.com")
        .await
        .expect("approve");
    increment_click_count(&mut conn, approved)
        .await
        .expect("click");
    increment_click_count(&mut conn, approved)
        .await
        .expect("click");
    assert_eq!(
        increment_click_count(&mut conn, 9999).await.expect("click"),
        0
    );

    let rows = list_approved_random(&mut conn, 10).await.expect("pool");
    assert_eq!(rows.len(), 1);
    let (id, text, _, _, clicks, _) = rows.into_iter().next().expect("row");
    assert_eq!((id, text.as_str(), clicks), (approved, "Approved one", 2));
    assert_eq!(delete_insult(&mut conn, approved).await.expect("delete"), 1);
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_announcement_window(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    let current = create_announcement(
        &mut conn,
        &NewAnnouncement {
            title: "Now",
            body: "<b>live</b>",
            category: "What's New",
            starts_at: at(1, 0),
            ends_at: at(10, 0),
            created_by_email: None,
            created_at: at(1, 0),
        },
    )
    .await
    .expect("create");
    create_announcement(
        &mut conn,
        &NewAnnouncement {
            title: "Later",
            body: "soon",
            category: "Tips",
            starts_at: at(20, 0),
            ends_at: at(25, 0),
            created_by_email: Some("op@example.com"),
            created_at: at(2, 0),
        },
    )
    .await
    .expect("create");

    let active = list_active_announcements(&mut conn, at(10, 0))
        .await
        .expect("active");
    assert_eq!(active.iter().map(|a| a.id).collect::<Vec<_>>(), [current]);
    assert_eq!(list_announcements(&mut conn).await.expect("all").len(), 2);

    let changes = AnnouncementChanges {
        title: "Now and later",
        body: "edited",
        category: "What's New",
        starts_at: at(1, 0),
        ends_at: at(30, 0),
    };
    assert_eq!(
        update_announcement(&mut conn, current, &changes)
            .await
            .expect("update"),
        1
    );
    let active = list_active_announcements(&mut conn, at(22, 0))
        .await
        .expect("active");
    assert_eq!(active.len(), 2);
    assert_eq!(
        active.first().map(|a| a.title.as_str()),
        Some("Later")
    );

    assert_eq!(
        delete_announcement(&mut conn, current).await.expect("delete"),
        1
    );
    assert_eq!(
        delete_all_announcements(&mut conn).await.expect("delete all"),
        1
    );
}

#[cfg(feature = "sqlite")]
#[rstest]
#[tokio::test]
async fn test_audit_features(#[future] migrated_conn: DbConnection) {
    let mut conn = migrated_conn.await;
    audit_sqlite_features(&mut conn)
        .await
        .expect("sqlite feature audit failed");
}

#[cfg(feature = "postgres")]
#[tokio::test]
#[ignore = "requires embedded PostgreSQL server"]
async fn test_audit_postgres() {
    use postgresql_embedded::PostgreSQL;

    let mut pg = PostgreSQL::default();
    pg.setup().await.expect("failed to set up postgres");
    pg.start().await.expect("failed to start postgres");
    pg.create_database("test")
        .await
        .expect("failed to create db");
    let url = pg.settings().url("test");
    let mut conn = diesel_async::AsyncPgConnection::establish(&url)
        .await
        .expect("failed to connect to postgres");
    audit_postgres_features(&mut conn)
        .await
        .expect("postgres feature audit failed");
    pg.stop().await.expect("failed to stop postgres");
}
