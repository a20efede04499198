//! Test utilities for integration tests
#![allow(dead_code)]
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};
use chrono::{Duration, Local, NaiveDateTime};

use lynxhealth::api::AppState;
use lynxhealth::api::app;
use lynxhealth::core::AppConfig;
use lynxhealth::core::db::async_db;
use lynxhealth::core::db::initialize_db;
use lynxhealth::scheduling::week::week_start;

/// Config pointing at a fresh temporary directory. The directory is
/// kept on disk so the database outlives this call.
pub fn test_config(api_base_url: &str) -> AppConfig {
    let dir = tempfile::Builder::new()
        .prefix("lynxhealth")
        .tempdir()
        .expect("Failed to create temp directory")
        .keep();
    let storage_path = dir.display().to_string();

    AppConfig {
        db_path: dir.join("lynxhealth.db").display().to_string(),
        storage_path,
        api_base_url: api_base_url.to_string(),
        poll_interval_secs: 1,
        calendar_days: 14,
    }
}

/// Creates a test application router backed by a new database.
///
/// Tests share the clock, so add a `#[serial]` to anything booking
/// the same times.
pub async fn test_app() -> Router {
    let app_config = test_config("http://127.0.0.1:2222");
    let db = async_db(&app_config.db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to initialize db");
        Ok(())
    })
    .await
    .unwrap();

    let app_state = AppState::new(db, app_config);
    app(Arc::new(RwLock::new(app_state)))
}

/// Serve a test app on a random local port and return its base URL
pub async fn spawn_test_server() -> String {
    let router = test_app().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

/// Next week's Monday at `hour:minute`, always in the future
pub fn next_monday_at(hour: u32, minute: u32) -> NaiveDateTime {
    let monday = week_start(Local::now().date_naive()) + Duration::days(7);
    monday.and_hms_opt(hour, minute, 0).unwrap()
}

/// `2024-01-08T09:00:00`
pub fn iso(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}
