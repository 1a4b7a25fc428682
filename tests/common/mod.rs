//! 통합 테스트 공용 헬퍼
//!
//! 인메모리 SQLite(연결 1개)에 실제 스키마를 만들고 사용자/활동을 시드합니다.
//! 동시성 테스트는 연결이 여러 개인 파일 SQLite를 씁니다.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use campus_hub::config::{establish_connection, AppConfig};
use campus_hub::domain::activity::entity::activity::{self, ActivityCategory, ActivityStatus};
use campus_hub::domain::activity::status::{evaluate_status, ActivitySchedule};
use campus_hub::domain::notification::NotificationDispatcher;
use campus_hub::domain::user::entity::user::{self, UserRole};
use campus_hub::state::AppState;
use campus_hub::utils::error::AppError;
use campus_hub::utils::jwt::encode_access_token;
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ConnectOptions, DatabaseConnection, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Mutex;

pub const JWT_SECRET: &str = "test-secret-key";

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    establish_connection(options, true)
        .await
        .expect("failed to prepare sqlite schema")
}

/// 여러 연결이 실제로 동시에 트랜잭션을 여는 파일 기반 DB
///
/// 반환된 `TempDir`이 drop되면 파일이 지워지므로 테스트가 끝날 때까지 들고 있어야 합니다.
pub async fn setup_file_db(max_connections: u32) -> (DatabaseConnection, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("campus.db").display());

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .min_connections(max_connections)
        .sqlx_logging(false);

    let db = establish_connection(options, true)
        .await
        .expect("failed to prepare sqlite schema");

    (db, dir)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        db_schema_update: true,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 3600,
        cors_origins: vec!["http://localhost:5173".to_string()],
        status_sweep_interval_secs: 0,
    }
}

/// 발송 요청만 기록하는 알림 구현
#[derive(Default)]
pub struct RecordingDispatcher {
    pub published: Mutex<Vec<i64>>,
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn activity_published(&self, activity: &activity::Model) -> Result<usize, AppError> {
        self.published.lock().await.push(activity.activity_id);
        Ok(1)
    }
}

pub fn test_state(db: DatabaseConnection, notifier: Arc<dyn NotificationDispatcher>) -> AppState {
    AppState {
        db,
        config: Arc::new(test_config()),
        notifier,
    }
}

pub fn test_app(db: DatabaseConnection) -> (Router, Arc<RecordingDispatcher>) {
    let recorder = Arc::new(RecordingDispatcher::default());
    let app = campus_hub::app(test_state(db, recorder.clone()));
    (app, recorder)
}

pub async fn seed_user(
    db: &DatabaseConnection,
    student_id: &str,
    name: &str,
    role: UserRole,
) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        student_id: Set(student_id.to_string()),
        email: Set(format!("{}@campus.edu", student_id)),
        name: Set(name.to_string()),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed user")
}

pub async fn seed_students(db: &DatabaseConnection, count: usize) -> Vec<user::Model> {
    let mut users = Vec::with_capacity(count);
    for i in 0..count {
        let student_id = format!("2024{:04}", i + 1);
        users.push(seed_user(db, &student_id, &format!("学生{}", i + 1), UserRole::User).await);
    }
    users
}

/// 활동 시드용 시간 설정
#[derive(Debug, Clone, Copy)]
pub struct ScheduleSeed {
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub activity_start: DateTime<Utc>,
    pub activity_end: Option<DateTime<Utc>>,
}

impl ScheduleSeed {
    /// 신청 base+1h~+2h, 시작 +3h, 종료 +5h
    pub fn standard(base: DateTime<Utc>) -> Self {
        Self {
            registration_start: Some(base + Duration::hours(1)),
            registration_end: Some(base + Duration::hours(2)),
            activity_start: base + Duration::hours(3),
            activity_end: Some(base + Duration::hours(5)),
        }
    }

    /// base 시점에 이미 신청 가능한 일정
    pub fn open_at(base: DateTime<Utc>) -> Self {
        Self {
            registration_start: Some(base - Duration::hours(1)),
            registration_end: Some(base + Duration::hours(1)),
            activity_start: base + Duration::hours(2),
            activity_end: Some(base + Duration::hours(4)),
        }
    }

    /// 신청 기간이 없는 일정
    pub fn without_registration(base: DateTime<Utc>) -> Self {
        Self {
            registration_start: None,
            registration_end: None,
            activity_start: base + Duration::hours(2),
            activity_end: None,
        }
    }
}

pub async fn seed_activity(
    db: &DatabaseConnection,
    title: &str,
    capacity: i32,
    schedule: ScheduleSeed,
    created_at: DateTime<Utc>,
) -> activity::Model {
    let status: ActivityStatus = evaluate_status(
        created_at,
        &ActivitySchedule {
            registration_start: schedule.registration_start,
            registration_end: schedule.registration_end,
            activity_start: schedule.activity_start,
            activity_end: schedule.activity_end,
        },
    );

    activity::ActiveModel {
        title: Set(title.to_string()),
        description: Set(format!("{} 활동 설명", title)),
        location: Set("大礼堂".to_string()),
        organizer: Set("校团委".to_string()),
        notes: Set(None),
        image: Set(String::new()),
        category: Set(ActivityCategory::Lecture),
        capacity: Set(capacity),
        registration_start: Set(schedule.registration_start),
        registration_end: Set(schedule.registration_end),
        activity_start: Set(schedule.activity_start),
        activity_end: Set(schedule.activity_end),
        status: Set(status),
        created_by: Set(None),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed activity")
}

pub fn bearer(user_id: i64) -> String {
    let token = encode_access_token(user_id, JWT_SECRET, 3600).expect("failed to sign token");
    format!("Bearer {}", token)
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is not json")
}
