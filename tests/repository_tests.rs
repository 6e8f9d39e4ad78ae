//! PostgreSQL 存储集成测试
//!
//! 需要可用的数据库：TEST_DATABASE_URL=postgres://... cargo test -- --ignored

use axum::http::StatusCode;
use chrono::Utc;
use empstat::{
    models::{
        common::ListWindow,
        identity::{Credential, Identity, Role},
        subject::Subject,
    },
    repository::{DataStore, PgStore, StoreError},
    routes,
};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;

mod common;
use common::{create_test_app_state_with, create_test_config, register, request, send};

/// 初始化测试数据库
async fn setup_test_store() -> PgStore {
    let config = create_test_config();
    let store = PgStore::connect(&config.database)
        .await
        .expect("Failed to connect test database");

    store.migrate().await.expect("Failed to run migrations");

    sqlx::query("TRUNCATE TABLE assessments, trainings, subjects, credentials, identities CASCADE")
        .execute(store.pool())
        .await
        .expect("Failed to clean test tables");

    store
}

fn identity(id: &str, email: &str) -> (Identity, Credential) {
    let now = Utc::now();
    (
        Identity {
            id: id.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            middle_name: None,
            last_name: None,
            role: Role::Employee,
            created_at: now,
            updated_at: now,
        },
        Credential {
            identity_id: id.to_string(),
            password_hash: "hash".to_string(),
            updated_at: now,
        },
    )
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_identity_constraints() {
    let store = setup_test_store().await;

    let (user, credential) = identity("u1", "u1@example.com");
    store.create_identity(user, credential).await.unwrap();

    let (dup, credential) = identity("u2", "u1@example.com");
    let err = store.create_identity(dup, credential).await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));

    // 事务回滚，u2 不应留下凭据
    assert!(store.find_credential("u2").await.unwrap().is_none());

    let found = store.find_identity_by_email("u1@example.com").await.unwrap();
    assert_eq!(found.unwrap().id, "u1");

    assert!(store.delete_identity("u1").await.unwrap());
    assert!(store.find_credential("u1").await.unwrap().is_none());
    assert!(!store.delete_identity("u1").await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_subject_listing_window() {
    let store = setup_test_store().await;
    let now = Utc::now();

    for id in ["a", "b", "c"] {
        store
            .create_subject(Subject {
                id: id.to_string(),
                name: id.to_uppercase(),
                min_marks: 0.0,
                max_marks: 100.0,
                total_time: 30,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    let page = store
        .list_subjects(ListWindow {
            from: Some(1),
            count: 1,
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "b");
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_register_login_through_router() {
    let store: Arc<dyn DataStore> = Arc::new(setup_test_store().await);
    let state = create_test_app_state_with(store);
    let app = routes::create_router(state);

    let (status, _, json) = send(&app, request("GET", "/ready", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["checks"][0]["name"], "store:postgres");

    register(&app, "u1").await;

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/v1/auth/login",
            Some(json!({"id": "u1", "password": common::TEST_PASSWORD})),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
