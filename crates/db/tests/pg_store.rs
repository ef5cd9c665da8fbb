//! Postgres-backed store tests.
//!
//! These need a live database (`DATABASE_URL`) and are ignored by default:
//! `cargo test -p sangeet-db -- --ignored`.

use assert_matches::assert_matches;
use serde_json::json;
use sqlx::PgPool;

use sangeet_db::models::generation::{ArtifactUpdate, NewGenerationRecord};
use sangeet_db::models::status::GenerationStatus;
use sangeet_db::{AuditLogSink, GenerationStore, PgGenerationStore, StoreError};

async fn seeded(pool: PgPool) -> (PgGenerationStore, i64) {
    let store = PgGenerationStore::new(pool);
    let record = store
        .create_record(&NewGenerationRecord {
            parameters: json!({"scale": "yaman", "cycle": "teental"}),
            prompt: "Calm instrumental piece".into(),
            regenerated_from: None,
        })
        .await
        .unwrap();
    store
        .register_dispatch(record.id, "abc123", &json!({"prompt_chars": 23}))
        .await
        .unwrap();
    (store, record.id)
}

fn artifact(url: &str) -> ArtifactUpdate {
    ArtifactUpdate {
        primary_url: url.into(),
        all_urls: vec![url.into(), "https://x/b.mp3".into()],
        title: Some("Yaman".into()),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn dispatch_creates_task_and_audit_entry(pool: PgPool) {
    let (store, record_id) = seeded(pool).await;

    let task = store.find_task("abc123").await.unwrap().unwrap();
    assert_eq!(task.record_id, record_id);
    assert_eq!(task.status(), GenerationStatus::Pending);

    let audit = store.list_audit("abc123").await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].detail["status"], "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_task_id_maps_to_duplicate_error(pool: PgPool) {
    let (store, record_id) = seeded(pool).await;
    let other = store
        .create_record(&NewGenerationRecord {
            parameters: json!({}),
            prompt: "again".into(),
            regenerated_from: Some(record_id),
        })
        .await
        .unwrap();
    let err = store
        .register_dispatch(other.id, "abc123", &json!({}))
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::DuplicateTask(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn second_attach_is_a_no_op(pool: PgPool) {
    let (store, record_id) = seeded(pool).await;

    let first = store
        .attach_artifact(record_id, &artifact("https://x/a.mp3"))
        .await
        .unwrap()
        .expect("first attach writes");
    assert_eq!(first.status(), GenerationStatus::Complete);
    assert_eq!(first.artifact_urls.len(), 2);

    let second = store
        .attach_artifact(record_id, &artifact("https://x/other.mp3"))
        .await
        .unwrap();
    assert!(second.is_none());

    let record = store.find_record(record_id).await.unwrap().unwrap();
    assert_eq!(record.artifact_url.as_deref(), Some("https://x/a.mp3"));

    let task = store.find_task("abc123").await.unwrap().unwrap();
    assert_eq!(task.status(), GenerationStatus::Complete);
    assert!(store.list_open_tasks().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failure_is_terminal(pool: PgPool) {
    let (store, record_id) = seeded(pool).await;
    assert!(store.mark_processing(record_id).await.unwrap());
    assert!(store.mark_failed(record_id, "rejected").await.unwrap());
    assert!(!store.mark_failed(record_id, "rejected twice").await.unwrap());
    assert!(store
        .attach_artifact(record_id, &artifact("https://x/a.mp3"))
        .await
        .unwrap()
        .is_none());
}
