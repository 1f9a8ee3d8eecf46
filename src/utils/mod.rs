use axum::Json;
use base64::{Engine, engine::general_purpose::URL_SAFE};
use bcrypt::{DEFAULT_COST, hash, verify};
use rand::RngCore;
use serde::Serialize;

use crate::error::ApiResult;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 生成 n 字节随机数的 URL 安全 base64 编码，用作会话令牌
pub fn generate_token(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

/// 3 到 32 位，只允许字母、数字、下划线、点和连字符
pub fn username_is_valid(username: &str) -> bool {
    (3..=32).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// 8 到 128 位可打印 ASCII
pub fn password_is_valid(password: &str) -> bool {
    (8..=128).contains(&password.len()) && password.chars().all(|c| (' '..='~').contains(&c))
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResult<T>> {
    Json(ApiResult::success(data))
}

pub fn error_to_api_response<T: Serialize>(code: i32, msg: &str) -> Json<ApiResult<T>> {
    Json(ApiResult::error(code, msg))
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const BANNED: i32 = 1006;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_alphabet() {
        let token = generate_token(32);
        // 32 字节 base64 后为 44 个字符（含填充）
        assert_eq!(token.len(), 44);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='))
        );
        assert_ne!(token, generate_token(32));
    }

    #[test]
    fn test_username_rules() {
        assert!(username_is_valid("movie_fan.01"));
        assert!(!username_is_valid("ab"));
        assert!(!username_is_valid("has space"));
        assert!(!username_is_valid(&"a".repeat(33)));
    }

    #[test]
    fn test_password_rules() {
        assert!(password_is_valid("correct horse"));
        assert!(!password_is_valid("short"));
        assert!(!password_is_valid("tab\tinside"));
        assert!(!password_is_valid(&"p".repeat(129)));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hashed = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hashed).unwrap());
        assert!(!verify_password("wrong-pass", &hashed).unwrap());
    }
}
