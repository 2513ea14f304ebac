//! Registration store and export tests.

mod common;

use common::*;
use regdesk::errors::AppError;
use regdesk::export::{self, ExportFormat, ExportTable, HEADER};
use regdesk::form::MemberInput;
use regdesk::models::event::{self, EventPatch};
use regdesk::models::registration::{self, RegistrationQuery};

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_hack_day_example() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Hack Day", false, 1, 1).await;

    let ok = registration::create(pool, &submission(id, None, &["Alice"])).await.unwrap();
    assert_eq!(ok.event_id, id);
    assert_eq!(ok.members.len(), 1);
    assert_eq!(ok.members[0].name, "Alice");

    let err = registration::create(pool, &submission(id, None, &["Alice", "Bob"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(registration::list(pool, Some(id)).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_team_name_dropped_when_not_required() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Talk", false, 1, 2).await;
    let reg = registration::create(pool, &submission(id, Some("Ignored Team"), &["Alice"]))
        .await
        .unwrap();
    assert!(reg.team_name.is_none());

    let stored = registration::get(pool, reg.id).await.unwrap();
    assert!(stored.registration.team_name.is_none());
    assert_eq!(stored.event_name, "Talk");
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_team_name_required() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Hackathon", true, 2, 4).await;

    let err = registration::create(pool, &submission(id, None, &["Alice", "Bob"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let reg = registration::create(pool, &submission(id, Some("Crabs"), &["Alice", "Bob", "Carol"]))
        .await
        .unwrap();
    assert_eq!(reg.team_name.as_deref(), Some("Crabs"));
    assert_eq!(reg.members.len(), 3);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_member_details_round_trip_through_jsonb() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Lab", false, 1, 2).await;
    let mut sub = submission(id, None, &[]);
    sub.members.push(MemberInput {
        name: " Alice ".into(),
        email: Some("alice@example.com".into()),
        reg_no: Some("21BCE0001".into()),
    });
    sub.members.push(MemberInput::named(""));

    let reg = registration::create(pool, &sub).await.unwrap();
    let stored = registration::list(pool, Some(id)).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].members, reg.members);
    assert_eq!(stored[0].members[0].name, "Alice");
    assert_eq!(stored[0].members[0].reg_no.as_deref(), Some("21BCE0001"));
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_team_lead_stored_and_required() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Led", false, 1, 1).await;
    let reg = registration::create(pool, &submission(id, None, &["Alice"])).await.unwrap();
    let stored = registration::get(pool, reg.id).await.unwrap();
    assert_eq!(stored.registration.team_lead.name, "Dana Lead");
    assert_eq!(stored.registration.team_lead.phone.as_deref(), Some("+91 98765 43210"));
    assert_eq!(stored.registration.team_lead.reg_no, None);

    let mut sub = submission(id, None, &["Alice"]);
    sub.team_lead = None;
    let err = registration::create(pool, &sub).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_required_member_needs_email() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Emails", false, 1, 2).await;
    let mut sub = submission(id, None, &[]);
    sub.members.push(MemberInput::named("Alice"));
    let err = registration::create(pool, &sub).await.unwrap_err();
    match err {
        AppError::Validation(errors) => assert_eq!(errors, vec!["Member 1 email is required".to_string()]),
        other => panic!("expected validation error, got {other:?}"),
    }

    // Optional second member without an email is fine
    let mut sub = submission(id, None, &["Alice"]);
    sub.members.push(MemberInput::named("Bob"));
    let reg = registration::create(pool, &sub).await.unwrap();
    assert_eq!(reg.members[1].email, None);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_nul_in_submission_is_validation_error() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Nul", true, 1, 1).await;

    let mut sub = submission(id, Some("Crabs"), &[]);
    sub.members.push(MemberInput::with_email("Al\u{0}ice", "alice@example.com"));
    assert!(matches!(registration::create(pool, &sub).await, Err(AppError::Validation(_))));

    let sub = submission(id, Some("Cr\u{0}abs"), &["Alice"]);
    assert!(matches!(registration::create(pool, &sub).await, Err(AppError::Validation(_))));

    assert!(registration::list(pool, Some(id)).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_unknown_event_is_not_found() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let err = registration::create(pool, &submission(987_654, None, &["Alice"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_inactive_event_rejects_registrations() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Closed", false, 1, 1).await;
    event::update(pool, id, &EventPatch { active: Some(false), ..Default::default() })
        .await
        .unwrap();

    let err = registration::create(pool, &submission(id, None, &["Alice"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_constraints_checked_at_creation_time() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Growing", false, 1, 1).await;
    registration::create(pool, &submission(id, None, &["Alice"])).await.unwrap();

    event::update(pool, id, &EventPatch { min_members: Some(2), max_members: Some(3), ..Default::default() })
        .await
        .unwrap();

    // Existing registration is untouched; new ones follow the new range
    assert!(registration::create(pool, &submission(id, None, &["Bob"])).await.is_err());
    registration::create(pool, &submission(id, None, &["Bob", "Carol"])).await.unwrap();
    assert_eq!(registration::list(pool, Some(id)).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_list_filters_by_event_in_creation_order() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let a = create_event(pool, "A", false, 1, 1).await;
    let b = create_event(pool, "B", false, 1, 1).await;
    let r1 = registration::create(pool, &submission(a, None, &["One"])).await.unwrap();
    let r2 = registration::create(pool, &submission(b, None, &["Two"])).await.unwrap();
    let r3 = registration::create(pool, &submission(a, None, &["Three"])).await.unwrap();

    let all: Vec<i64> = registration::list(pool, None).await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(all, vec![r1.id, r2.id, r3.id]);

    let only_a: Vec<i64> = registration::list(pool, Some(a)).await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(only_a, vec![r1.id, r3.id]);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_search_and_pagination() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Search Me", true, 1, 2).await;
    for i in 0..7 {
        registration::create(pool, &submission(id, Some(&format!("Team {i}")), &["Member"]))
            .await
            .unwrap();
    }
    registration::create(pool, &submission(id, Some("Ferris Fans"), &["Zed", "Ferris"]))
        .await
        .unwrap();

    let page = registration::search(pool, &RegistrationQuery { per_page: Some(5), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(page.total, 8);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total_pages, 2);
    // Newest first
    assert_eq!(page.items[0].registration.team_name.as_deref(), Some("Ferris Fans"));

    let page2 = registration::search(
        pool,
        &RegistrationQuery { page: Some(2), per_page: Some(5), ..Default::default() },
    )
    .await
    .unwrap();
    assert_eq!(page2.items.len(), 3);

    let hits = registration::search(pool, &RegistrationQuery { q: Some("ferris".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(hits.total, 1);

    let by_member = registration::search(pool, &RegistrationQuery { q: Some("zed".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(by_member.total, 1);

    let by_lead = registration::search(pool, &RegistrationQuery { q: Some("DANA.LEAD".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(by_lead.total, 8);

    let nul = registration::search(pool, &RegistrationQuery { q: Some("a\u{0}b".into()), ..Default::default() }).await;
    assert!(matches!(nul, Err(AppError::Validation(_))));

    let wildcard = registration::search(pool, &RegistrationQuery { q: Some("%".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(wildcard.total, 0);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_delete_registration() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Deletable", false, 1, 1).await;
    let reg = registration::create(pool, &submission(id, None, &["Alice"])).await.unwrap();

    registration::delete(pool, reg.id).await.unwrap();
    assert!(matches!(registration::get(pool, reg.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(registration::delete(pool, reg.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_stats_counts_today() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Counted", false, 1, 1).await;
    registration::create(pool, &submission(id, None, &["Alice"])).await.unwrap();
    registration::create(pool, &submission(id, None, &["Bob"])).await.unwrap();
    sqlx::query("UPDATE registrations SET created_at = now() - interval '3 days' WHERE members->0->>'name' = 'Bob'")
        .execute(pool)
        .await
        .unwrap();

    let stats = registration::stats(pool).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.today, 1);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_export_with_no_registrations_is_header_only() {
    let db = setup_test_db().await;
    let pool = db.pool();

    create_event(pool, "Empty", false, 1, 1).await;
    let rows = registration::list_for_export(pool, None).await.unwrap();
    let table = ExportTable::from_registrations(&rows);
    assert_eq!(table.header, HEADER.to_vec());
    assert!(table.rows.is_empty());

    let file = export::export(pool, None, ExportFormat::Xlsx).await.unwrap();
    assert_eq!(file.row_count, 0);
    assert!(file.bytes.starts_with(b"PK"));
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_export_rows_are_deterministic() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let solo = create_event(pool, "Solo", false, 1, 1).await;
    let team = create_event(pool, "Team Up", true, 1, 3).await;
    registration::create(pool, &submission(solo, None, &["Alice"])).await.unwrap();
    registration::create(pool, &submission(team, Some("Crabs"), &["Bob", "Carol"])).await.unwrap();

    let first = export::export(pool, None, ExportFormat::Csv).await.unwrap();
    let second = export::export(pool, None, ExportFormat::Csv).await.unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.row_count, 2);

    let csv = String::from_utf8(first.bytes).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    // The lead's phone starts with '+', so it is written as text
    assert!(lines[1].starts_with(
        "Solo,,Dana Lead,dana.lead@example.com,'+91 98765 43210,,Alice,alice@example.com,"
    ));
    assert!(lines[2].starts_with(
        "Team Up,Crabs,Dana Lead,dana.lead@example.com,'+91 98765 43210,,Bob; Carol,bob@example.com; carol@example.com,"
    ));

    let only_team = export::export(pool, Some(team), ExportFormat::Csv).await.unwrap();
    assert_eq!(only_team.row_count, 1);
}

#[tokio::test]
#[ignore] // Requires Postgres: TEST_DATABASE_URL=... cargo test -- --ignored
async fn test_dangling_event_reference_fails_export() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let id = create_event(pool, "Orphan Source", false, 1, 1).await;
    let reg = registration::create(pool, &submission(id, None, &["Alice"])).await.unwrap();

    // Simulate a reference left behind by out-of-band deletion
    sqlx::query("ALTER TABLE registrations DROP CONSTRAINT registrations_event_id_fkey")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();

    let err = registration::list_for_export(pool, None).await.unwrap_err();
    match err {
        AppError::DanglingEvent { registration_id, event_id } => {
            assert_eq!(registration_id, reg.id);
            assert_eq!(event_id, id);
        }
        other => panic!("expected dangling event error, got {other:?}"),
    }
    assert!(matches!(
        export::export(pool, None, ExportFormat::Xlsx).await,
        Err(AppError::DanglingEvent { .. })
    ));
}
