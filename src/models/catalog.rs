use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 计量单位表 (unit_of_measure)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub id: i64,
    pub abbreviation: String, // 大写存储，唯一
}

/// 商品表 (product)，唯一键 (ean_code, owner_entity_id)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub quantity: i64, // 历次导入累计
    pub unit_of_measure_id: i64,
    pub owner_entity_id: i64,
    pub ean_code: String,
    pub expiry_date: Option<NaiveDate>, // 以最后一次导入为准
    pub brand: Option<String>,
}

/// 待插入的商品
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub unit_of_measure_id: i64,
    pub owner_entity_id: i64,
    pub ean_code: String,
    pub expiry_date: Option<NaiveDate>,
}
