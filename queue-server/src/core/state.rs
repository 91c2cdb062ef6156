use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::booking::{BookingService, LifecycleEvent, LifecycleEvents, reminder};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::Config;
use crate::db::DbService;
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是排队节点的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | booking | Arc<BookingService> | 预约准入与工单生命周期 |
/// | events | Arc<LifecycleEvents> | 生命周期事件广播 (通知接收端挂接点) |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 预约服务 (准入控制 + 取消)
    pub booking: Arc<BookingService>,
    /// 生命周期事件广播器
    pub events: Arc<LifecycleEvents>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/queue.db)
    /// 3. 预约服务和事件广播器
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        // 0. Ensure work_dir structure exists
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {}", e)))?;

        // 1. Initialize DB
        let db_path = config.database_dir().join("queue.db");
        let db_service = DbService::new(&db_path).await?;
        let db = db_service.db;

        // 2. Initialize services
        let events = Arc::new(LifecycleEvents::new());
        let booking = Arc::new(BookingService::new(
            db.clone(),
            config.cancellation_policy,
            config.capacity_mode,
            events.clone(),
        ));

        Ok(Self {
            config: config.clone(),
            db,
            booking,
            events,
        })
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 预约提醒扫描器 (Periodic)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let state = self.clone();
        let shutdown = tasks.shutdown_token();
        tasks.spawn("appointment_reminder", TaskKind::Periodic, async move {
            reminder::run(state, shutdown).await;
        });

        tasks
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 发布生命周期事件 (通知接收端挂接点，不影响核心正确性)
    pub fn publish_event(&self, event: LifecycleEvent) {
        self.events.publish(event);
    }
}
