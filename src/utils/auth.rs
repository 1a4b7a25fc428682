use axum::{
    async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::header::COOKIE,
    http::request::Parts,
};

use crate::domain::user::entity::user::{self, UserRole};
use crate::domain::user::service::UserService;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::jwt::{decode_access_token, Claims};

/// 토큰을 담는 쿠키 이름
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// 인증된 사용자 정보를 담는 Extractor
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// JWT Claims에서 사용자 ID를 추출합니다.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.0
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("유효하지 않은 사용자 ID입니다.".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // 1. Authorization 헤더 우선, 없으면 쿠키
        let token = match parts.headers.get(AUTHORIZATION) {
            Some(auth_header) => {
                let auth_header_str = auth_header
                    .to_str()
                    .map_err(|_| AppError::Unauthorized("잘못된 헤더 형식입니다.".to_string()))?;

                auth_header_str
                    .strip_prefix("Bearer ")
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Unauthorized("토큰 형식이 올바르지 않습니다.".to_string())
                    })?
            }
            None => extract_token_from_cookie(parts)?,
        };

        let claims = decode_access_token(&token, &state.config.jwt_secret)?;

        Ok(AuthUser(claims))
    }
}

/// 관리자 전용 Extractor
///
/// 토큰 검증 후 사용자 디렉터리에서 역할을 다시 확인합니다.
pub struct AdminUser(pub user::Model);

impl AdminUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let user_id = auth.user_id()?;

        let user = UserService::find_active(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("존재하지 않는 사용자입니다.".to_string()))?;

        if user.role != UserRole::Admin {
            tracing::warn!(user_id = user_id, "관리자 전용 API 접근 시도");
            return Err(AppError::Forbidden("관리자 권한이 필요합니다.".to_string()));
        }

        Ok(AdminUser(user))
    }
}

/// 쿠키에서 access_token 추출
fn extract_token_from_cookie(parts: &Parts) -> Result<String, AppError> {
    let cookie_header = parts
        .headers
        .get(COOKIE)
        .ok_or_else(|| AppError::Unauthorized("로그인이 필요합니다.".to_string()))?;

    let cookie_str = cookie_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("잘못된 쿠키 형식입니다.".to_string()))?;

    // "name1=value1; name2=value2" 형식
    cookie_str
        .split(';')
        .filter_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(ACCESS_TOKEN_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("로그인이 필요합니다.".to_string()))
}
