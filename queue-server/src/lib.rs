//! Queue Server - 排队叫号与预约调度服务
//!
//! # 架构概述
//!
//! 本模块是 Queue Server 的主入口，提供以下核心功能：
//!
//! - **预约引擎** (`booking`): 时段生成、预约准入控制、工单状态机
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **HTTP API** (`api`): RESTful API 接口
//! - **后台任务** (`core::tasks`): 预约提醒扫描
//!
//! # 模块结构
//!
//! ```text
//! queue-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # 调用方身份提取 (上游网关注入)
//! ├── booking/       # 预约核心: 时段、准入、生命周期、策略
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 错误、日志、时间工具
//! └── db/            # 数据库层 (models + repository)
//! ```

pub mod api;
pub mod auth;
pub mod booking;
pub mod core;
pub mod db;
pub mod routes;
pub mod utils;

// Re-export 公共类型
pub use auth::CallerIdentity;
pub use booking::{BookingError, BookingService, LifecycleEvent};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   ____
  / __ \__  _____  __  _____
 / / / / / / / _ \/ / / / _ \
/ /_/ / /_/ /  __/ /_/ /  __/
\___\_\__,_/\___/\__,_/\___/
    "#
    );
}
