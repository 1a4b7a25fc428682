//! HTTP 라우터 통합 테스트
//!
//! 핸들러는 실제 시각을 쓰므로 활동 일정도 현재 시각 기준으로 시드합니다.

mod common;

use axum::http::{header, Method, StatusCode};
use campus_hub::domain::user::entity::user::UserRole;
use chrono::{Duration, Utc};
use common::{
    bearer, body_json, empty_request, json_request, seed_activity, seed_user, setup_db, test_app,
    ScheduleSeed,
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn should_create_activity_as_admin_and_dispatch_notification() {
    // Arrange
    let db = setup_db().await;
    let admin = seed_user(&db, "A0001", "管理员", UserRole::Admin).await;
    let (app, recorder) = test_app(db);
    let now = Utc::now();
    let token = bearer(admin.user_id);

    // Act
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/activities",
            Some(&token),
            json!({
                "title": "校园马拉松",
                "location": "操场",
                "organizer": "体育部",
                "category": "体育",
                "capacity": 50,
                "registrationStart": (now - Duration::hours(1)).to_rfc3339(),
                "registrationEnd": (now + Duration::hours(1)).to_rfc3339(),
                "activityStart": (now + Duration::hours(2)).to_rfc3339(),
                "activityEnd": (now + Duration::hours(4)).to_rfc3339(),
                "status": "ended"
            }),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["isSuccess"], true);
    assert_eq!(body["code"], "COMMON201");
    assert_eq!(body["result"]["status"], "registering");
    assert_eq!(body["result"]["statusLabel"], "报名中");

    let activity_id = body["result"]["activityId"].as_i64().unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(*recorder.published.lock().await, vec![activity_id]);
}

#[tokio::test]
async fn should_forbid_activity_creation_for_students() {
    let db = setup_db().await;
    let student = seed_user(&db, "20240001", "张三", UserRole::User).await;
    let (app, recorder) = test_app(db);
    let now = Utc::now();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/activities",
            Some(&bearer(student.user_id)),
            json!({
                "title": "私人聚会",
                "location": "宿舍",
                "organizer": "张三",
                "category": "文艺",
                "activityStart": (now + Duration::hours(2)).to_rfc3339()
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "COMMON403");
    assert!(recorder.published.lock().await.is_empty());
}

#[tokio::test]
async fn should_require_token_for_registration() {
    let db = setup_db().await;
    let activity = seed_activity(&db, "讲座", 0, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/activities/{}/register", activity.activity_id),
            None,
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "AUTH4001");
}

#[tokio::test]
async fn should_register_and_list_my_registrations() {
    // Arrange
    let db = setup_db().await;
    let student = seed_user(&db, "20240001", "张三", UserRole::User).await;
    let activity =
        seed_activity(&db, "讲座", 10, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);
    let token = bearer(student.user_id);

    // Act
    let registered = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/activities/{}/register", activity.activity_id),
            Some(&token),
            json!({ "phone": "13800000000" }),
        ))
        .await
        .unwrap();
    let mine = app
        .oneshot(empty_request(
            Method::GET,
            "/api/activities/my-registrations",
            Some(&token),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(registered.status(), StatusCode::CREATED);
    let registered = body_json(registered).await;
    assert_eq!(registered["result"]["status"], "confirmed");
    assert_eq!(registered["result"]["name"], "张三");

    assert_eq!(mine.status(), StatusCode::OK);
    let mine = body_json(mine).await;
    let items = mine["result"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["activityId"], activity.activity_id);
}

#[tokio::test]
async fn should_distinguish_registration_failures_by_code() {
    // Arrange
    let db = setup_db().await;
    let students = common::seed_students(&db, 2).await;
    let now = Utc::now();
    let not_open = seed_activity(&db, "未开放", 0, ScheduleSeed::standard(now), now).await;
    let closed = seed_activity(
        &db,
        "已截止",
        0,
        ScheduleSeed::standard(now - Duration::minutes(150)),
        now - Duration::minutes(150),
    )
    .await;
    let tiny = seed_activity(&db, "小班课", 1, ScheduleSeed::open_at(now), now).await;
    let (app, _) = test_app(db);
    let first = bearer(students[0].user_id);
    let second = bearer(students[1].user_id);

    let register = |activity_id: i64, token: &str| {
        json_request(
            Method::POST,
            &format!("/api/activities/{}/register", activity_id),
            Some(token),
            json!({}),
        )
    };

    // Act
    let missing = app.clone().oneshot(register(9999, &first)).await.unwrap();
    let early = app
        .clone()
        .oneshot(register(not_open.activity_id, &first))
        .await
        .unwrap();
    let late = app
        .clone()
        .oneshot(register(closed.activity_id, &first))
        .await
        .unwrap();
    let ok = app
        .clone()
        .oneshot(register(tiny.activity_id, &first))
        .await
        .unwrap();
    let duplicate = app
        .clone()
        .oneshot(register(tiny.activity_id, &first))
        .await
        .unwrap();
    let full = app
        .clone()
        .oneshot(register(tiny.activity_id, &second))
        .await
        .unwrap();

    // Assert
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["code"], "ACTIVITY4041");
    assert_eq!(early.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(early).await["code"], "REGISTRATION4002");
    assert_eq!(late.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(late).await["code"], "REGISTRATION4003");
    assert_eq!(ok.status(), StatusCode::CREATED);
    // 정원이 찬 뒤의 재신청은 정원 검사에서 먼저 걸림
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(duplicate).await["code"], "REGISTRATION4091");
    assert_eq!(full.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(full).await["code"], "REGISTRATION4091");
}

#[tokio::test]
async fn should_report_duplicate_registration_when_seats_remain() {
    let db = setup_db().await;
    let student = seed_user(&db, "20240001", "张三", UserRole::User).await;
    let activity =
        seed_activity(&db, "讲座", 10, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);
    let token = bearer(student.user_id);
    let uri = format!("/api/activities/{}/register", activity.activity_id);

    let first = app
        .clone()
        .oneshot(json_request(Method::POST, &uri, Some(&token), json!({})))
        .await
        .unwrap();
    let second = app
        .oneshot(json_request(Method::POST, &uri, Some(&token), json!({})))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], "REGISTRATION4092");
}

#[tokio::test]
async fn should_cancel_own_registration_and_reject_second_cancel() {
    // Arrange
    let db = setup_db().await;
    let student = seed_user(&db, "20240001", "张三", UserRole::User).await;
    let activity =
        seed_activity(&db, "讲座", 10, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);
    let token = bearer(student.user_id);

    let registered = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/activities/{}/register", activity.activity_id),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    let registration_id = body_json(registered).await["result"]["registrationId"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/activities/registrations/{}", registration_id);

    // Act
    let cancelled = app
        .clone()
        .oneshot(empty_request(Method::DELETE, &uri, Some(&token)))
        .await
        .unwrap();
    let again = app
        .oneshot(empty_request(Method::DELETE, &uri, Some(&token)))
        .await
        .unwrap();

    // Assert
    assert_eq!(cancelled.status(), StatusCode::OK);
    let cancelled = body_json(cancelled).await;
    assert_eq!(cancelled["result"]["status"], "cancelled");
    assert!(cancelled["result"]["cancelledAt"].is_string());
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(again).await["code"], "REGISTRATION4004");
}

#[tokio::test]
async fn should_list_registrations_for_admin_with_activity_name() {
    // Arrange
    let db = setup_db().await;
    let admin = seed_user(&db, "A0001", "管理员", UserRole::Admin).await;
    let student = seed_user(&db, "20240001", "张三", UserRole::User).await;
    let activity =
        seed_activity(&db, "科技讲座", 0, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);

    app.clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/activities/{}/register", activity.activity_id),
            Some(&bearer(student.user_id)),
            json!({}),
        ))
        .await
        .unwrap();

    // Act
    let response = app
        .oneshot(empty_request(
            Method::GET,
            &format!(
                "/api/activities/{}/registrations?status=confirmed&limit=10",
                activity.activity_id
            ),
            Some(&bearer(admin.user_id)),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["total"], 1);
    assert_eq!(body["result"]["activityName"], "科技讲座");
    assert_eq!(
        body["result"]["registrations"][0]["userEmail"],
        "20240001@campus.edu"
    );
}

#[tokio::test]
async fn should_reject_out_of_range_page_limit() {
    let db = setup_db().await;
    let (app, _) = test_app(db);

    let response = app
        .oneshot(empty_request(Method::GET, "/api/activities?limit=500", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_export_registrations_as_csv_attachment() {
    // Arrange
    let db = setup_db().await;
    let admin = seed_user(&db, "A0001", "管理员", UserRole::Admin).await;
    let activity =
        seed_activity(&db, "新生舞会", 0, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);

    // Act
    let response = app
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/activities/{}/registrations/export", activity.activity_id),
            Some(&bearer(admin.user_id)),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/csv"));
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
}

#[tokio::test]
async fn should_delete_activity_through_api() {
    let db = setup_db().await;
    let admin = seed_user(&db, "A0001", "管理员", UserRole::Admin).await;
    let activity =
        seed_activity(&db, "旧活动", 0, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);
    let uri = format!("/api/activities/{}", activity.activity_id);

    let deleted = app
        .clone()
        .oneshot(empty_request(Method::DELETE, &uri, Some(&bearer(admin.user_id))))
        .await
        .unwrap();
    let fetched = app
        .oneshot(empty_request(Method::GET, &uri, None))
        .await
        .unwrap();

    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(
        body_json(deleted).await["result"]["activityId"],
        activity.activity_id
    );
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_report_healthy_database() {
    let db = setup_db().await;
    let (app, _) = test_app(db);

    let response = app
        .oneshot(empty_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["reachable"], true);
}

#[tokio::test]
async fn should_fill_empty_registrant_fields_from_directory() {
    // Arrange
    let db = setup_db().await;
    let student = seed_user(&db, "20240001", "张三", UserRole::User).await;
    let activity =
        seed_activity(&db, "讲座", 0, ScheduleSeed::open_at(Utc::now()), Utc::now()).await;
    let (app, _) = test_app(db);

    // Act
    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/activities/{}/register", activity.activity_id),
            Some(&bearer(student.user_id)),
            json!({ "name": "", "studentId": "  " }),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["result"]["name"], "张三");
    assert_eq!(body["result"]["studentId"], "20240001");
}
