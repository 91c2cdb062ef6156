//! Service Listing API 模块
//!
//! 目录 CRUD 属外部管理后台，这里只暴露预约界面需要的只读列表。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/services", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/", get(handler::list))
}
