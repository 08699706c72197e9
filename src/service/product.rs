use crate::db::store::CatalogTx;
use crate::error::{StoreError, StoreResult};
use crate::models::NewProduct;
use crate::service::unit;
use chrono::NaiveDate;

/// 一条待归一化的商品 (来自发票明细，已完成类型转换)
#[derive(Debug, Clone)]
pub struct ProductDraft<'a> {
    pub name: &'a str,
    pub quantity: i64,
    pub unit_abbreviation: &'a str,
    pub ean_code: &'a str,
    pub owner_entity_id: i64,
    pub expiry_date: Option<NaiveDate>,
}

/// 商品归一化: (ean_code, owner_entity_id) -> 商品ID
///
/// 已存在时数量累加、有效期覆盖；不存在时先归一化计量单位再创建。
pub async fn resolve<T: CatalogTx>(tx: &mut T, draft: &ProductDraft<'_>) -> StoreResult<i64> {
    if let Some(id) = tx
        .find_product_by_ean_and_owner(draft.ean_code, draft.owner_entity_id)
        .await?
    {
        return merge(tx, id, draft).await;
    }

    let unit_id = unit::resolve(tx, draft.unit_abbreviation).await?;
    let product = NewProduct {
        name: draft.name.to_string(),
        quantity: draft.quantity,
        unit_of_measure_id: unit_id,
        owner_entity_id: draft.owner_entity_id,
        ean_code: draft.ean_code.to_string(),
        expiry_date: draft.expiry_date,
    };

    if let Some(id) = tx.create_product(&product).await? {
        tracing::info!(
            "Created product {} {:?} (EAN {}, owner {})",
            id,
            draft.name,
            draft.ean_code,
            draft.owner_entity_id
        );
        return Ok(id);
    }

    // 并发导入抢先创建了同一商品，按已存在处理
    tracing::warn!(
        "Product EAN {} for owner {} inserted concurrently, merging instead",
        draft.ean_code,
        draft.owner_entity_id
    );
    match tx
        .find_product_by_ean_and_owner(draft.ean_code, draft.owner_entity_id)
        .await?
    {
        Some(id) => merge(tx, id, draft).await,
        None => Err(StoreError::Conflict {
            entity: "product",
            key: format!("({}, {})", draft.ean_code, draft.owner_entity_id),
        }),
    }
}

async fn merge<T: CatalogTx>(tx: &mut T, id: i64, draft: &ProductDraft<'_>) -> StoreResult<i64> {
    tx.update_product_quantity_and_expiry(id, draft.quantity, draft.expiry_date)
        .await?;
    tracing::debug!("Product {} += {}, expiry now {:?}", id, draft.quantity, draft.expiry_date);
    Ok(id)
}
