pub mod handlers;

pub use handlers::*;

use crate::service::OrderImporter;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;

/// 构建全部路由
pub fn router(pool: PgPool, max_upload_bytes: usize) -> Router {
    let importer = Arc::new(OrderImporter::new(pool.clone()));

    // 导入
    let import_routes = Router::new()
        .route("/insert_xml", post(insert_xml))
        .with_state(importer);

    // 报表
    let report_routes = Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:order_id/items", get(list_order_items))
        .route("/orders/:order_id/items.csv", get(export_order_items))
        .with_state(pool);

    Router::new()
        .route("/health", get(health_check))
        .route("/read_xml", post(read_xml))
        .merge(import_routes)
        .merge(report_routes)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(max_upload_bytes)))
}
