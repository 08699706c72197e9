use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 采购单主表 (purchase_order)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: i64,
    pub owner_entity_id: i64,
    pub purchase_date: NaiveDate,
    pub invoice_code: Option<String>, // 不去重，同一张发票可多次导入
}

/// 采购单明细 (order_line_item)，创建后不再修改
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub product_id: i64,
    pub order_id: i64,
    pub quantity: i64,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub owner_entity_id: i64,
    pub purchase_date: NaiveDate,
    pub invoice_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLineItem {
    pub product_id: i64,
    pub order_id: i64,
    pub quantity: i64,
    pub unit_price: BigDecimal,
}

/// 报表: 采购单明细 + 商品名称/品牌
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    pub quantity: i64,
    pub unit_price: BigDecimal,
}
