//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`slots`] - 可预约时段查询
//! - [`appointments`] - 预约创建、取消、当前预约
//! - [`services`] - 可预约服务列表 (只读)
//! - [`notifications`] - 用户通知 (只读)

pub mod appointments;
pub mod health;
pub mod notifications;
pub mod services;
pub mod slots;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
