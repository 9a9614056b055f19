//! 身份中间件

use axum::{extract::Request, middleware::Next, response::Response};

use super::{CurrentUser, USER_ID_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER, parse_identity};
use crate::security_log;
use crate::utils::AppError;

/// Paths under `/api` reachable without gateway identity headers
const PUBLIC_API_ROUTES: &[&str] = &["/api/payments/webhook"];

/// 身份中间件 - 要求网关身份头
///
/// 解析 `x-user-*` 头并将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (`/health` 等)
/// - `/api/payments/webhook` (支付回调)
///
/// # 错误
///
/// 缺少或无效的身份头返回 401
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if !path.starts_with("/api/") || PUBLIC_API_ROUTES.contains(&path) {
        return Ok(next.run(req).await);
    }

    let headers = req.headers();
    let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());
    let user = parse_identity(
        header(USER_ID_HEADER),
        header(USER_NAME_HEADER),
        header(USER_ROLE_HEADER),
    )
    .inspect_err(|e| {
        security_log!(
            "WARN",
            "identity_rejected",
            error = e.message.clone(),
            uri = format!("{:?}", req.uri())
        );
    })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn current_user(req: &Request) -> Result<&CurrentUser, AppError> {
    req.extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_authenticated)
}

/// 员工中间件 - 拒绝顾客角色
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AppError> {
    let user = current_user(&req)?;
    if let Err(e) = user.require_staff() {
        security_log!(
            "WARN",
            "staff_required",
            user_id = user.id,
            user_role = user.role.as_str()
        );
        return Err(e);
    }
    Ok(next.run(req).await)
}

/// 收银中间件 - 要求 cashier 或 admin
pub async fn require_cashier(req: Request, next: Next) -> Result<Response, AppError> {
    let user = current_user(&req)?;
    if let Err(e) = user.require_cashier() {
        security_log!(
            "WARN",
            "cashier_required",
            user_id = user.id,
            user_role = user.role.as_str()
        );
        return Err(e);
    }
    Ok(next.run(req).await)
}
