//! Service Repository
//!
//! 目录 CRUD 属外部管理后台；本核心只需要读取和 (测试/种子) 创建。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Service, ServiceCreate};
use crate::utils::time::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "service";

#[derive(Clone)]
pub struct ServiceRepository {
    base: BaseRepository,
}

impl ServiceRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active services
    pub async fn find_active(&self) -> RepoResult<Vec<Service>> {
        let services: Vec<Service> = self
            .base
            .db()
            .query("SELECT * FROM service WHERE is_active = true ORDER BY service_name")
            .await?
            .take(0)?;
        Ok(services)
    }

    /// Find service by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Service>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid service ID: {}", id)))?;
        let service: Option<Service> = self.base.db().select(thing).await?;
        Ok(service)
    }

    /// Create a new service (seeding / catalog hand-off)
    pub async fn create(&self, data: ServiceCreate) -> RepoResult<Service> {
        let service = Service {
            id: None,
            service_code: data.service_code,
            service_name: data.service_name,
            description: data.description,
            estimated_minutes: data.estimated_minutes,
            is_active: true,
            created_at: now_millis(),
        };

        let created: Option<Service> = self.base.db().create(TABLE).content(service).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create service".to_string()))
    }
}
