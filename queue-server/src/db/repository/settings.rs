//! Appointment Settings Repository
//!
//! 准入判定每次都读取最新配置 — 过期的 enabled/advance_booking_days
//! 是正确性隐患，不允许缓存。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{AppointmentSettings, AppointmentSettingsPatch};
use crate::utils::time::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::Surreal;

const TABLE: &str = "appointment_settings";

#[derive(Clone)]
pub struct AppointmentSettingsRepository {
    base: BaseRepository,
}

impl AppointmentSettingsRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the settings row for a service; absence means appointments are off
    pub async fn find_by_service(&self, service_id: &str) -> RepoResult<Option<AppointmentSettings>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM appointment_settings WHERE service = $service LIMIT 1")
            .bind(("service", service_id.to_string()))
            .await?;
        let rows: Vec<AppointmentSettings> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Seed the defaults row for a newly activated service (idempotent)
    pub async fn ensure_for_service(&self, service_id: &str) -> RepoResult<AppointmentSettings> {
        if let Some(existing) = self.find_by_service(service_id).await? {
            return Ok(existing);
        }

        let settings = AppointmentSettings::defaults_for(service_id, now_millis());
        let created: Option<AppointmentSettings> =
            self.base.db().create(TABLE).content(settings).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create settings".to_string()))
    }

    /// Apply an administrative patch to a service's settings
    pub async fn update(
        &self,
        service_id: &str,
        patch: AppointmentSettingsPatch,
    ) -> RepoResult<AppointmentSettings> {
        let existing = self
            .find_by_service(service_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Settings for {} not found", service_id)))?;

        let mut updated = existing.clone();
        if let Some(v) = patch.enabled {
            updated.enabled = v;
        }
        if let Some(v) = patch.advance_booking_days {
            updated.advance_booking_days = v;
        }
        if let Some(v) = patch.slot_duration_minutes {
            if v == 0 {
                return Err(RepoError::Validation(
                    "slot_duration_minutes must be positive".to_string(),
                ));
            }
            updated.slot_duration_minutes = v;
        }
        if let Some(v) = patch.day_start {
            updated.day_start = v;
        }
        if let Some(v) = patch.day_end {
            updated.day_end = v;
        }
        if let Some(v) = patch.slots_per_interval {
            updated.slots_per_interval = v;
        }
        if let Some(v) = patch.reminder_minutes {
            updated.reminder_minutes = v;
        }
        if let Some(v) = patch.allow_cancellation {
            updated.allow_cancellation = v;
        }
        if let Some(v) = patch.cancellation_deadline_hours {
            updated.cancellation_deadline_hours = v;
        }

        if updated.day_start >= updated.day_end {
            return Err(RepoError::Validation(
                "day_start must be before day_end".to_string(),
            ));
        }

        updated.updated_at = now_millis();
        // id 由 UPDATE 目标指定，不随内容提交
        updated.id = None;

        let id = existing
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Settings row has no id".to_string()))?;
        let saved: Option<AppointmentSettings> =
            self.base.db().update(id).content(updated).await?;
        saved.ok_or_else(|| RepoError::Database("Failed to update settings".to_string()))
    }
}
