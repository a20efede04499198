//! Integration tests for the slots and blocked time endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_string, iso, next_monday_at, test_app};

    const ADMIN: &str = "nurse@admin.edu";

    async fn post_block(app: &Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/availability/slots")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = body_to_string(response.into_body()).await;
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    async fn get_json(app: &Router, uri: &str) -> Value {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_str(&body_to_string(response.into_body()).await).unwrap()
    }

    fn monday_block(hour: u32, minute: u32) -> Value {
        let start = next_monday_at(hour, minute);
        json!({
            "admin_email": ADMIN,
            "date": start.date().to_string(),
            "time": start.time().to_string(),
        })
    }

    /// Tests the health check at the root
    #[tokio::test]
    #[serial]
    async fn it_reports_health() {
        let app = test_app().await;
        let body = get_json(&app, "/").await;
        assert_eq!(body["status"], "Health Center API Running");
    }

    /// Tests that students can not block times
    #[tokio::test]
    #[serial]
    async fn it_rejects_non_admin_blocks() {
        let app = test_app().await;
        let mut body = monday_block(10, 0);
        body["admin_email"] = json!("kim@school.edu");

        let (status, body) = post_block(&app, body).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Only admins can block appointment times.");
    }

    /// Tests that a date and time are required
    #[tokio::test]
    #[serial]
    async fn it_requires_date_and_time() {
        let app = test_app().await;
        let (status, body) = post_block(&app, json!({"admin_email": ADMIN})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Date and time are required.");
    }

    /// Tests that the lunch hour can not be blocked
    #[tokio::test]
    #[serial]
    async fn it_rejects_lunch_blocks() {
        let app = test_app().await;
        let (status, body) = post_block(&app, monday_block(12, 15)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "12:00 PM to 1:00 PM is reserved for lunch and is always blocked."
        );
    }

    /// Tests blocking, listing, a duplicate block and unblocking
    #[tokio::test]
    #[serial]
    async fn it_blocks_and_unblocks_a_time() {
        let app = test_app().await;
        let start = next_monday_at(10, 0);

        let (status, block) = post_block(&app, monday_block(10, 0)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(block["start_time"], iso(start));
        let id = block["id"].as_i64().unwrap();

        let (status, body) = post_block(&app, monday_block(10, 0)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["detail"], "This time is already blocked.");

        let blocks = get_json(&app, "/availability/blocked-times").await;
        assert_eq!(blocks.as_array().unwrap().len(), 1);
        assert_eq!(blocks[0]["id"], id);

        // Blocked starts are not offered as raw slots
        let slots = get_json(&app, "/availability/slots?students_only=true").await;
        assert!(
            slots
                .as_array()
                .unwrap()
                .iter()
                .all(|s| s["start_time"] != iso(start))
        );

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/availability/slots/{}?admin_email={}", id, ADMIN))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let blocks = get_json(&app, "/availability/blocked-times").await;
        assert!(blocks.as_array().unwrap().is_empty());
    }

    /// Tests unblocking a missing block and unblocking as a student
    #[tokio::test]
    #[serial]
    async fn it_rejects_bad_unblocks() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/availability/slots/42?admin_email=kim@school.edu")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
        assert_eq!(body["detail"], "Only admins can unblock appointment times.");

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/availability/slots/42?admin_email={}", ADMIN))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
        assert_eq!(body["detail"], "Blocked time not found.");
    }

    /// Tests generated slots skip lunch and use negative ids
    #[tokio::test]
    #[serial]
    async fn it_generates_raw_slots() {
        let app = test_app().await;
        let slots = get_json(&app, "/availability/slots").await;
        let slots = slots.as_array().unwrap();

        assert!(!slots.is_empty());
        assert!(slots.iter().all(|s| s["id"].as_i64().unwrap() < 0));
        assert!(
            slots
                .iter()
                .all(|s| !s["time"].as_str().unwrap().starts_with("12:"))
        );
        let monday = iso(next_monday_at(9, 0));
        assert!(slots.iter().any(|s| s["start_time"] == monday));
    }

    /// Tests malformed bodies, paths and queries still answer with a detail
    #[tokio::test]
    #[serial]
    async fn it_reports_extractor_rejections_as_detail() {
        let app = test_app().await;

        let mut body = monday_block(10, 0);
        body["date"] = json!("not-a-date");
        let (status, body) = post_block(&app, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("date"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/availability/slots/abc?admin_email={}", ADMIN))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid URL"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/availability/slots?students_only=maybe")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
        assert!(
            body["detail"]
                .as_str()
                .unwrap()
                .starts_with("Failed to deserialize query string")
        );
    }

    /// Tests a 30 minute block removes both of its raw slots
    #[tokio::test]
    #[serial]
    async fn it_removes_every_slot_a_long_block_covers() {
        let app = test_app().await;
        let mut body = monday_block(10, 0);
        body["duration_minutes"] = json!(30);
        let (status, block) = post_block(&app, body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(block["end_time"], iso(next_monday_at(10, 30)));

        let (status, body) = post_block(&app, monday_block(10, 15)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["detail"], "This time is already blocked.");

        let slots = get_json(&app, "/availability/slots").await;
        let starts: Vec<&str> = slots
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["start_time"].as_str().unwrap())
            .collect();
        assert!(!starts.contains(&iso(next_monday_at(10, 0)).as_str()));
        assert!(!starts.contains(&iso(next_monday_at(10, 15)).as_str()));
        assert!(starts.contains(&iso(next_monday_at(10, 30)).as_str()));
    }
}
