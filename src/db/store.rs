//! 导入流程对持久层的最小约定
//!
//! 所有写操作都在一个 [`CatalogTx`] 里完成：要么 `commit` 全部生效，
//! 要么 `rollback` (或直接丢弃事务) 全部撤销。
//! 唯一性由存储层保证，`create_*` 采用 "不存在才插入" 的原子语义，
//! 并发写入者抢先时返回 `None`，调用方再按查询处理。

use crate::error::StoreResult;
use crate::models::{NewOrderLineItem, NewProduct, NewPurchaseOrder};
use chrono::NaiveDate;
use std::future::Future;

/// 可开启事务的存储
pub trait CatalogStore: Send + Sync {
    type Tx: CatalogTx;

    /// 借出一个连接并开启事务
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;
}

/// 一次导入的工作单元
pub trait CatalogTx: Send + Sized {
    /// 按大写缩写查询计量单位
    fn find_unit_by_abbreviation(
        &mut self,
        abbreviation: &str,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    /// 插入计量单位；缩写已存在时返回 None
    fn create_unit(
        &mut self,
        abbreviation: &str,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    fn find_product_by_ean_and_owner(
        &mut self,
        ean_code: &str,
        owner_entity_id: i64,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    /// 数量累加，有效期直接覆盖
    fn update_product_quantity_and_expiry(
        &mut self,
        product_id: i64,
        quantity: i64,
        expiry_date: Option<NaiveDate>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// 插入商品；(ean_code, owner_entity_id) 已存在时返回 None
    fn create_product(
        &mut self,
        product: &NewProduct,
    ) -> impl Future<Output = StoreResult<Option<i64>>> + Send;

    fn create_order(
        &mut self,
        order: &NewPurchaseOrder,
    ) -> impl Future<Output = StoreResult<i64>> + Send;

    fn create_order_line_item(
        &mut self,
        item: &NewOrderLineItem,
    ) -> impl Future<Output = StoreResult<i64>> + Send;

    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;
}
