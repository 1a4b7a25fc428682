use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use tracing::{error, warn};
use validator::ValidationErrors;

use super::response::ErrorResponse;

/// 신청 기간 위반 상세 (너무 이르거나 이미 지났거나)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    NotYetOpen,
    AlreadyClosed,
}

/// 애플리케이션 전역 에러 타입
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    InternalError(String),
    ValidationError(String),
    JsonParseFailed(String),

    // 활동
    ActivityNotFound(String),
    ActivityHasActiveRegistrations(String),

    // 신청
    RegistrationNotFound(String),
    RegistrationNotRequired(String),
    RegistrationWindowClosed(WindowViolation, String),
    ActivityFull(String),
    AlreadyRegistered(String),
    AlreadyCancelled(String),
    RegistrationStateConflict(String),
}

impl AppError {
    /// 에러 메시지 반환
    pub fn message(&self) -> String {
        match self {
            AppError::JsonParseFailed(msg) => format!("잘못된 요청 형식입니다: {}", msg),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::InternalError(msg)
            | AppError::ValidationError(msg)
            | AppError::ActivityNotFound(msg)
            | AppError::ActivityHasActiveRegistrations(msg)
            | AppError::RegistrationNotFound(msg)
            | AppError::RegistrationNotRequired(msg)
            | AppError::RegistrationWindowClosed(_, msg)
            | AppError::ActivityFull(msg)
            | AppError::AlreadyRegistered(msg)
            | AppError::AlreadyCancelled(msg)
            | AppError::RegistrationStateConflict(msg) => msg.clone(),
        }
    }

    /// 에러 코드 반환
    pub fn error_code(&self) -> String {
        match self {
            AppError::BadRequest(_) => "COMMON400",
            AppError::Unauthorized(_) => "AUTH4001",
            AppError::Forbidden(_) => "COMMON403",
            AppError::InternalError(_) => "COMMON500",
            AppError::ValidationError(_) => "COMMON400",
            AppError::JsonParseFailed(_) => "COMMON400",
            AppError::ActivityNotFound(_) => "ACTIVITY4041",
            AppError::ActivityHasActiveRegistrations(_) => "ACTIVITY4091",
            AppError::RegistrationNotFound(_) => "REGISTRATION4041",
            AppError::RegistrationNotRequired(_) => "REGISTRATION4001",
            AppError::RegistrationWindowClosed(WindowViolation::NotYetOpen, _) => {
                "REGISTRATION4002"
            }
            AppError::RegistrationWindowClosed(WindowViolation::AlreadyClosed, _) => {
                "REGISTRATION4003"
            }
            AppError::AlreadyCancelled(_) => "REGISTRATION4004",
            AppError::RegistrationStateConflict(_) => "REGISTRATION4005",
            AppError::ActivityFull(_) => "REGISTRATION4091",
            AppError::AlreadyRegistered(_) => "REGISTRATION4092",
        }
        .to_string()
    }

    /// HTTP 상태 코드 반환
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::ValidationError(_)
            | AppError::JsonParseFailed(_)
            | AppError::RegistrationNotRequired(_)
            | AppError::RegistrationWindowClosed(..)
            | AppError::AlreadyCancelled(_)
            | AppError::RegistrationStateConflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ActivityNotFound(_) | AppError::RegistrationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::ActivityHasActiveRegistrations(_)
            | AppError::ActivityFull(_)
            | AppError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.message();

        if status.is_server_error() {
            error!("Internal Server Error: {}", message);
        } else {
            warn!(code = %error_code, "Request rejected: {}", message);
        }

        let error_response = ErrorResponse::new(error_code, message);

        (status, Json(error_response)).into_response()
    }
}

/// JsonRejection을 AppError로 변환
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::JsonParseFailed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("잘못된 경로 파라미터입니다: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("잘못된 쿼리 파라미터입니다: {}", rejection.body_text()))
    }
}

/// 검증 실패 시 첫 번째 필드 메시지를 사용
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "입력값이 올바르지 않습니다.".to_string());

        AppError::ValidationError(message)
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl AppError {
    pub fn validation_error(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}
