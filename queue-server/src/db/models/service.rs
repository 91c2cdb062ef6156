//! Service Model
//!
//! 服务目录由外部管理后台维护；本核心只读。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Service entity (业务窗口，如 "General Inquiry")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Short code used in ticket numbering (e.g. "GEN")
    pub service_code: String,
    pub service_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Estimated handling time in minutes (display hint only)
    #[serde(default)]
    pub estimated_minutes: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create service payload (catalog management / seeding)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCreate {
    pub service_code: String,
    pub service_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<i64>,
}
