//! 调用者身份
//!
//! 令牌签发与校验由外部身份服务负责，网关把校验后的身份写入请求头：
//!
//! | Header | 说明 |
//! |--------|------|
//! | `x-user-id` | 用户 ID (i64) |
//! | `x-user-name` | 显示名 (可选) |
//! | `x-user-role` | customer / cashier / staff / kitchen / admin |
//!
//! - [`CurrentUser`] - 当前用户上下文
//! - [`require_identity`] - 身份中间件
//! - [`require_staff`] / [`require_cashier`] - 角色检查

pub mod extractor;
pub mod middleware;

pub use middleware::{require_cashier, require_identity, require_staff};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::{AppError, ErrorCode};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Cashier,
    Staff,
    Kitchen,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Cashier => "cashier",
            Self::Staff => "staff",
            Self::Kitchen => "kitchen",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "cashier" => Ok(Self::Cashier),
            "staff" => Ok(Self::Staff),
            "kitchen" => Ok(Self::Kitchen),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::with_message(
                ErrorCode::NotAuthenticated,
                format!("Unknown role: {other}"),
            )),
        }
    }
}

/// 当前用户上下文
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(id: i64, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }

    /// 员工 (收银、后厨、店员、管理员)
    pub fn is_staff(&self) -> bool {
        !matches!(self.role, Role::Customer)
    }

    /// 可收现金、可代客下单
    pub fn is_cashier(&self) -> bool {
        matches!(self.role, Role::Cashier | Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::with_message(ErrorCode::RoleRequired, "Staff role required")
                .with_detail("role", self.role.as_str()))
        }
    }

    pub fn require_cashier(&self) -> Result<(), AppError> {
        if self.is_cashier() {
            Ok(())
        } else {
            Err(AppError::with_message(ErrorCode::RoleRequired, "Cashier role required")
                .with_detail("role", self.role.as_str()))
        }
    }
}

/// Parse identity from raw header values
pub(crate) fn parse_identity(
    id: Option<&str>,
    name: Option<&str>,
    role: Option<&str>,
) -> Result<CurrentUser, AppError> {
    let id = id.ok_or_else(AppError::not_authenticated)?;
    let id: i64 = id.trim().parse().map_err(|_| {
        AppError::with_message(ErrorCode::NotAuthenticated, format!("Invalid user id: {id}"))
    })?;
    let role: Role = role.unwrap_or("customer").trim().parse()?;
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or_default();

    Ok(CurrentUser::new(id, name, role))
}
