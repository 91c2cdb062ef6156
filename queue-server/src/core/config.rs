use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::booking::{CancellationPolicy, CapacityMode};

/// 服务器配置 - 排队节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/queue/server | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | BUSINESS_TIMEZONE | UTC | 业务时区 (IANA 名称) |
/// | REQUEST_TIMEOUT_MS | 30000 | 写操作截止时间(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
/// | CANCELLATION_POLICY | lenient | 取消策略: lenient \| enforced |
/// | CAPACITY_POLICY | unlimited | 容量策略: unlimited \| enforced |
/// | REMINDER_POLL_SECS | 60 | 提醒扫描周期(秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/queue HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区 - "今天"、时段截断均以此时区为准
    pub timezone: Tz,
    /// 写操作 (预约/取消) 的请求截止时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
    /// 取消策略 (lenient 不校验截止时间)
    pub cancellation_policy: CancellationPolicy,
    /// 容量策略 (unlimited 所有时段均可预约)
    pub capacity_mode: CapacityMode,
    /// 预约提醒扫描周期 (秒)
    pub reminder_poll_secs: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/queue/server".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(chrono_tz::UTC),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
            cancellation_policy: std::env::var("CANCELLATION_POLICY")
                .ok()
                .map(|v| CancellationPolicy::from_name(&v))
                .unwrap_or_default(),
            capacity_mode: std::env::var("CAPACITY_POLICY")
                .ok()
                .map(|v| CapacityMode::from_name(&v))
                .unwrap_or_default(),
            reminder_poll_secs: std::env::var("REMINDER_POLL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 写操作请求截止时间
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
