use crate::db::store::CatalogTx;
use crate::error::{StoreError, StoreResult};

/// 计量单位归一化: 缩写 (忽略大小写) -> 单位ID，不存在则创建
pub async fn resolve<T: CatalogTx>(tx: &mut T, abbreviation: &str) -> StoreResult<i64> {
    let abbreviation = abbreviation.to_uppercase();

    if let Some(id) = tx.find_unit_by_abbreviation(&abbreviation).await? {
        return Ok(id);
    }

    if let Some(id) = tx.create_unit(&abbreviation).await? {
        tracing::info!("Created unit of measure {:?} (id {})", abbreviation, id);
        return Ok(id);
    }

    // 并发导入抢先插入了同一缩写，重新查询一次
    tracing::warn!("Unit {:?} inserted concurrently, re-reading", abbreviation);
    tx.find_unit_by_abbreviation(&abbreviation)
        .await?
        .ok_or(StoreError::Conflict {
            entity: "unit_of_measure",
            key: abbreviation,
        })
}
