//! 测试用的内存存储，模拟 PostgreSQL 的事务与唯一约束语义
#![allow(dead_code)]

use crate::db::store::{CatalogStore, CatalogTx};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    NewOrderLineItem, NewProduct, NewPurchaseOrder, OrderLineItem, Product, PurchaseOrder,
    UnitOfMeasure,
};
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::time::ChronoLocal;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// 真实 PostgreSQL 连接池 (已执行迁移)；未设置 DATABASE_URL 时返回 None，测试跳过
pub(crate) async fn pg_test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    crate::db::run_migrations(&pool).await.expect("run migrations");
    Some(pool)
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CatalogState {
    pub units: Vec<UnitOfMeasure>,
    pub products: Vec<Product>,
    pub orders: Vec<PurchaseOrder>,
    pub order_items: Vec<OrderLineItem>,
    next_id: i64,
}

impl CatalogState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn product(&self, ean_code: &str, owner_entity_id: i64) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.ean_code == ean_code && p.owner_entity_id == owner_entity_id)
    }
}

#[derive(Debug, Default)]
struct Faults {
    /// 接下来的 N 次查询返回 "不存在"，模拟并发写入者已插入但本事务尚未看到
    stale_lookups: usize,
    /// 第 N 条采购单明细插入时报错
    fail_on_order_item: Option<usize>,
}

/// 内存存储；事务直接修改共享状态，开启时保存快照，回滚或丢弃时恢复
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state.lock().unwrap().clone()
    }

    /// 在事务外直接插入一个计量单位 (模拟另一个已提交的导入)
    pub fn seed_unit(&self, abbreviation: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.units.push(UnitOfMeasure {
            id,
            abbreviation: abbreviation.to_string(),
        });
        id
    }

    pub fn seed_product(&self, product: NewProduct) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.products.push(Product {
            id,
            name: product.name,
            quantity: product.quantity,
            unit_of_measure_id: product.unit_of_measure_id,
            owner_entity_id: product.owner_entity_id,
            ean_code: product.ean_code,
            expiry_date: product.expiry_date,
            brand: None,
        });
        id
    }

    pub fn stale_lookups(&self, n: usize) {
        self.faults.lock().unwrap().stale_lookups = n;
    }

    pub fn fail_on_order_item(&self, nth: usize) {
        self.faults.lock().unwrap().fail_on_order_item = Some(nth);
    }
}

impl CatalogStore for MemoryCatalog {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let snapshot = self.snapshot();
        Ok(MemoryTx {
            state: Arc::clone(&self.state),
            faults: Arc::clone(&self.faults),
            snapshot: Some(snapshot),
            order_items_written: 0,
        })
    }
}

pub(crate) struct MemoryTx {
    state: Arc<Mutex<CatalogState>>,
    faults: Arc<Mutex<Faults>>,
    snapshot: Option<CatalogState>,
    order_items_written: usize,
}

impl MemoryTx {
    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap()
    }

    fn stale(&self) -> bool {
        let mut faults = self.faults.lock().unwrap();
        if faults.stale_lookups > 0 {
            faults.stale_lookups -= 1;
            true
        } else {
            false
        }
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.state() = snapshot;
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        self.restore();
    }
}

impl CatalogTx for MemoryTx {
    async fn find_unit_by_abbreviation(&mut self, abbreviation: &str) -> StoreResult<Option<i64>> {
        if self.stale() {
            return Ok(None);
        }
        Ok(self
            .state()
            .units
            .iter()
            .find(|u| u.abbreviation == abbreviation)
            .map(|u| u.id))
    }

    async fn create_unit(&mut self, abbreviation: &str) -> StoreResult<Option<i64>> {
        let mut state = self.state();
        if state.units.iter().any(|u| u.abbreviation == abbreviation) {
            return Ok(None);
        }
        let id = state.next_id();
        state.units.push(UnitOfMeasure {
            id,
            abbreviation: abbreviation.to_string(),
        });
        Ok(Some(id))
    }

    async fn find_product_by_ean_and_owner(
        &mut self,
        ean_code: &str,
        owner_entity_id: i64,
    ) -> StoreResult<Option<i64>> {
        if self.stale() {
            return Ok(None);
        }
        Ok(self.state().product(ean_code, owner_entity_id).map(|p| p.id))
    }

    async fn update_product_quantity_and_expiry(
        &mut self,
        product_id: i64,
        quantity: i64,
        expiry_date: Option<NaiveDate>,
    ) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(product) = state.products.iter_mut().find(|p| p.id == product_id) {
            product.quantity += quantity;
            product.expiry_date = expiry_date;
        }
        Ok(())
    }

    async fn create_product(&mut self, product: &NewProduct) -> StoreResult<Option<i64>> {
        let mut state = self.state();
        if state.product(&product.ean_code, product.owner_entity_id).is_some() {
            return Ok(None);
        }
        if !state.units.iter().any(|u| u.id == product.unit_of_measure_id) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "product references a missing unit_of_measure".into(),
            )));
        }
        let id = state.next_id();
        state.products.push(Product {
            id,
            name: product.name.clone(),
            quantity: product.quantity,
            unit_of_measure_id: product.unit_of_measure_id,
            owner_entity_id: product.owner_entity_id,
            ean_code: product.ean_code.clone(),
            expiry_date: product.expiry_date,
            brand: None,
        });
        Ok(Some(id))
    }

    async fn create_order(&mut self, order: &NewPurchaseOrder) -> StoreResult<i64> {
        let mut state = self.state();
        let id = state.next_id();
        state.orders.push(PurchaseOrder {
            id,
            owner_entity_id: order.owner_entity_id,
            purchase_date: order.purchase_date,
            invoice_code: order.invoice_code.clone(),
        });
        Ok(id)
    }

    async fn create_order_line_item(&mut self, item: &NewOrderLineItem) -> StoreResult<i64> {
        self.order_items_written += 1;
        if self.faults.lock().unwrap().fail_on_order_item == Some(self.order_items_written) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "connection reset while inserting order_line_item".into(),
            )));
        }
        let mut state = self.state();
        let id = state.next_id();
        state.order_items.push(OrderLineItem {
            id,
            product_id: item.product_id,
            order_id: item.order_id,
            quantity: item.quantity,
            unit_price: item.unit_price.clone(),
        });
        Ok(id)
    }

    async fn commit(mut self) -> StoreResult<()> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(mut self) -> StoreResult<()> {
        self.restore();
        Ok(())
    }
}
