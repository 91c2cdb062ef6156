//! Caller Identity
//!
//! 认证/会话管理属外部协作方：上游网关完成登录校验后，把已验证的用户
//! 标识注入 `x-user-id` 请求头。核心操作一律接收显式的调用方身份参数，
//! 绝不读取环境态。

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::utils::AppError;

/// Header installed by the upstream gateway after authentication
pub const USER_ID_HEADER: &str = "x-user-id";

/// Pre-validated caller identity
///
/// Use this extractor in protected handlers; a missing or empty header
/// rejects the request with 401.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(CallerIdentity {
            user_id: user_id.to_string(),
        })
    }
}
