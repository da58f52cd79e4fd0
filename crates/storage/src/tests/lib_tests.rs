use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("confession_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("responses.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn insert_assigns_fresh_id_and_grows_list_by_one() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let before = storage.list_responses().await.expect("list");
    assert!(before.is_empty());

    let first = storage
        .insert_response(ResponseKind::Yes, Some("Mozilla/5.0"), None)
        .await
        .expect("insert");
    let second = storage
        .insert_response(ResponseKind::Yes, Some("Mozilla/5.0"), None)
        .await
        .expect("insert");
    assert_ne!(first.id, second.id);

    let after = storage.list_responses().await.expect("list");
    assert_eq!(after.len(), 2);
}

#[tokio::test]
async fn lists_responses_oldest_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage
        .insert_response(ResponseKind::Yes, None, None)
        .await
        .expect("insert a");
    let b = storage
        .insert_response(ResponseKind::Maybe, None, None)
        .await
        .expect("insert b");
    let c = storage
        .insert_response(ResponseKind::Yes, None, None)
        .await
        .expect("insert c");

    let listed = storage.list_responses().await.expect("list");
    assert_eq!(
        listed.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![a.id, b.id, c.id]
    );
    assert!(listed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn reads_are_idempotent() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_response(ResponseKind::Maybe, Some("agent"), Some("10.0.0.1"))
        .await
        .expect("insert");

    let first = storage.list_responses().await.expect("first read");
    let second = storage.list_responses().await.expect("second read");
    assert_eq!(first, second);
}

#[tokio::test]
async fn counts_by_kind() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for kind in [ResponseKind::Yes, ResponseKind::Maybe, ResponseKind::Yes] {
        storage
            .insert_response(kind, None, None)
            .await
            .expect("insert");
    }

    assert_eq!(
        storage
            .count_responses(ResponseKind::Yes)
            .await
            .expect("yes count"),
        2
    );
    assert_eq!(
        storage
            .count_responses(ResponseKind::Maybe)
            .await
            .expect("maybe count"),
        1
    );
    assert_eq!(
        storage.count_all_responses().await.expect("total count"),
        3
    );
}

#[tokio::test]
async fn latest_is_none_for_empty_store() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.latest_response().await.expect("latest").is_none());
}

#[tokio::test]
async fn latest_tracks_most_recent_insert() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_response(ResponseKind::Yes, None, None)
        .await
        .expect("insert");
    let newest = storage
        .insert_response(ResponseKind::Maybe, None, None)
        .await
        .expect("insert");

    let latest = storage
        .latest_response()
        .await
        .expect("latest")
        .expect("some latest");
    assert_eq!(latest.id, newest.id);
    assert_eq!(latest.kind, ResponseKind::Maybe);
}

#[tokio::test]
async fn round_trips_absent_user_agent_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_response(ResponseKind::Yes, None, None)
        .await
        .expect("insert");

    let listed = storage.list_responses().await.expect("list");
    assert_eq!(listed[0].user_agent, None);
    assert_eq!(listed[0].ip_address, None);
}

#[tokio::test]
async fn round_trips_metadata_verbatim() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_response(
            ResponseKind::Maybe,
            Some("Mozilla/5.0 (iPhone; Mobile)"),
            Some("203.0.113.7"),
        )
        .await
        .expect("insert");

    let listed = storage.list_responses().await.expect("list");
    assert_eq!(
        listed[0].user_agent.as_deref(),
        Some("Mozilla/5.0 (iPhone; Mobile)")
    );
    assert_eq!(listed[0].ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn unknown_kind_in_legacy_table_errors_instead_of_coercing() {
    // A pre-existing responses table may predate the CHECK constraint, so a
    // foreign kind can be sitting in the column. Reads must refuse it rather
    // than report it as yes.
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    sqlx::query("DROP TABLE responses")
        .execute(storage.pool())
        .await
        .expect("drop");
    sqlx::query(
        "CREATE TABLE responses (
            id          TEXT PRIMARY KEY,
            response    TEXT NOT NULL,
            user_agent  TEXT,
            ip_address  TEXT,
            created_at  TEXT NOT NULL
        )",
    )
    .execute(storage.pool())
    .await
    .expect("create legacy table");
    sqlx::query("INSERT INTO responses (id, response, created_at) VALUES (?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind("no")
        .bind(Utc::now())
        .execute(storage.pool())
        .await
        .expect("insert foreign kind");

    let err = storage.list_responses().await.expect_err("must not coerce");
    assert!(err.to_string().contains("malformed stored response kind"));
    assert!(storage.latest_response().await.is_err());
}

#[tokio::test]
async fn stores_and_lists_status_checks() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let created = storage
        .insert_status_check("uptime-probe")
        .await
        .expect("insert");

    let listed = storage.list_status_checks().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].client_name, "uptime-probe");
}
