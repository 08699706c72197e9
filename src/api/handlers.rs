use crate::db::queries;
use crate::error::ImportError;
use crate::models::{InvoiceRecord, OrderItemView, PurchaseOrder};
use crate::nfe;
use crate::service::OrderImporter;
use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartError,
        rejection::{PathRejection, QueryRejection},
        Json, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// 接口错误: 状态码 + 错误信息 (+ 导入错误分类)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub kind: Option<&'static str>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            kind: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.kind {
            Some(kind) => json!({ "error": self.message, "kind": kind }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        let status = match e {
            ImportError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: e.to_string(),
            kind: Some(e.kind()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::bad_request(format!("invalid multipart body: {}", e.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Query failed: {}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Error: {}", e),
            kind: None,
        }
    }
}

/// 导入响应体
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub order_id: i64,
}

/// 报表查询参数
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_entity_id: i64,
}

/// 上传的表单内容
#[derive(Debug, Default)]
struct Upload {
    file: Option<(String, Bytes)>,
    owner_entity_id: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                upload.file = Some((file_name, content));
            }
            Some("owner_entity_id") => {
                upload.owner_entity_id = Some(field.text().await?);
            }
            _ => {}
        }
    }
    Ok(upload)
}

/// 取出上传的 .xml 文件内容
fn xml_file(upload: Upload) -> Result<Bytes, ApiError> {
    let (file_name, content) = upload
        .file
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if !file_name.to_lowercase().ends_with(".xml") {
        return Err(ApiError::bad_request("File must have a .xml extension"));
    }
    Ok(content)
}

fn owner_entity_id(raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("owner_entity_id is required"))?;
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("owner_entity_id must be an integer: {:?}", raw)))
}

/// 健康检查
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Local::now().to_rfc3339(),
    }))
}

/// 预览: 只解析 XML，不入库
pub async fn read_xml(multipart: Multipart) -> Result<Json<InvoiceRecord>, ApiError> {
    let content = xml_file(read_upload(multipart).await?)?;
    let record = nfe::extract(&content)?;
    Ok(Json(record))
}

/// 解析并导入 XML
pub async fn insert_xml(
    State(importer): State<Arc<OrderImporter<PgPool>>>,
    multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    let owner_entity_id = owner_entity_id(upload.owner_entity_id.as_deref())?;
    let content = xml_file(upload)?;

    let order_id = importer.import_xml(&content, owner_entity_id).await?;
    Ok(Json(ImportResponse {
        success: true,
        message: format!("Invoice imported as order {}", order_id),
        order_id,
    }))
}

/// 某主体的采购单列表
pub async fn list_orders(
    State(pool): State<PgPool>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<Vec<PurchaseOrder>>, ApiError> {
    let Query(query) = query?;
    let orders = queries::list_orders_by_owner(&pool, query.owner_entity_id).await?;
    Ok(Json(orders))
}

/// 采购单明细
pub async fn list_order_items(
    State(pool): State<PgPool>,
    order_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<OrderItemView>>, ApiError> {
    let Path(order_id) = order_id?;
    let items = queries::list_order_items(&pool, order_id).await?;
    Ok(Json(items))
}

/// 采购单明细 CSV 导出
pub async fn export_order_items(
    State(pool): State<PgPool>,
    order_id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(order_id) = order_id?;
    let items = queries::list_order_items(&pool, order_id).await?;
    let mut body = Vec::new();
    queries::export_order_items_csv(&items, &mut body).map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("CSV export failed: {}", e),
        kind: None,
    })?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
}
