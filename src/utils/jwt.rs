use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::AppError;

const ACCESS_TOKEN_TYPE: &str = "access";

/// JWT Claims 구조체
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (User ID)
    pub sub: String,
    /// Issued At
    pub iat: usize,
    /// Expiration
    pub exp: usize,
    /// Token Type (access)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Access Token 생성
///
/// 로그인/비밀번호 검증은 인증 서버 몫이고, 여기서는 같은 비밀키로 서명만 합니다.
pub fn encode_access_token(
    user_id: i64,
    secret: &str,
    expiration_seconds: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(expiration_seconds))
        .ok_or_else(|| AppError::InternalError("Invalid token expiration".into()))?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
        token_type: Some(ACCESS_TOKEN_TYPE.to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token creation failed: {}", e)))
}

/// Access Token 검증 (다른 타입의 토큰은 거부)
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("토큰이 만료되었습니다.".into())
        }
        _ => AppError::Unauthorized("유효하지 않은 토큰입니다.".into()),
    })?;

    if claims.token_type.as_deref() != Some(ACCESS_TOKEN_TYPE) {
        return Err(AppError::Unauthorized(
            "액세스 토큰이 아닙니다.".into(),
        ));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_and_decode_access_token() {
        // Arrange
        let secret = "test_secret";

        // Act
        let token = encode_access_token(42, secret, 3600).expect("Token generation failed");
        let claims = decode_access_token(&token, secret).expect("Token validation failed");

        // Assert
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.token_type.as_deref(), Some("access"));
    }

    #[test]
    fn should_reject_invalid_token() {
        let result = decode_access_token("invalid_token", "test_secret");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn should_reject_token_signed_with_other_secret() {
        let token = encode_access_token(1, "secret-a", 3600).unwrap();
        let result = decode_access_token(&token, "secret-b");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_expired_token() {
        // Validation::default()의 leeway(60초)보다 충분히 과거로 설정
        let token = encode_access_token(1, "test_secret", -600).unwrap();

        let result = decode_access_token(&token, "test_secret");

        match result {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "토큰이 만료되었습니다."),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
