use crate::db::store::{CatalogStore, CatalogTx};
use crate::error::{ImportError, ImportResult};
use crate::models::{InvoiceRecord, NewOrderLineItem, NewPurchaseOrder};
use crate::service::coerce;
use crate::service::product::{self, ProductDraft};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

/// 发票导入服务: InvoiceRecord -> 采购单 + 明细 + 商品目录
pub struct OrderImporter<S> {
    store: S,
}

/// 类型转换后的明细行
#[derive(Debug)]
struct PreparedItem<'a> {
    name: &'a str,
    unit_code: &'a str,
    ean_code: &'a str,
    quantity: i64,
    unit_price: BigDecimal,
    expiry_date: Option<NaiveDate>,
}

impl<S: CatalogStore> OrderImporter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 提取 + 导入
    pub async fn import_xml(&self, xml: &[u8], owner_entity_id: i64) -> ImportResult<i64> {
        let record = crate::nfe::extract(xml)?;
        self.import(&record, owner_entity_id).await
    }

    /// 在一个事务内导入整张发票，返回新采购单ID
    ///
    /// 任何一步失败都会回滚整个事务，不会留下部分导入的采购单或商品。
    pub async fn import(&self, record: &InvoiceRecord, owner_entity_id: i64) -> ImportResult<i64> {
        // 1. 类型转换 (开启事务前完成，失败时什么都不会写入)
        let purchase_date = coerce::date("dhEmi", &record.issued_at)?;
        let items = record
            .line_items
            .iter()
            .map(|item| -> ImportResult<PreparedItem> {
                Ok(PreparedItem {
                    name: &item.product_name,
                    unit_code: &item.unit_code,
                    ean_code: &item.ean_code,
                    quantity: coerce::quantity("qCom", &item.quantity)?,
                    unit_price: coerce::decimal("vUnCom", &item.unit_price)?,
                    expiry_date: item
                        .expiry_date
                        .as_deref()
                        .map(|text| coerce::date("dVal", text))
                        .transpose()?,
                })
            })
            .collect::<ImportResult<Vec<_>>>()?;

        tracing::info!(
            "Importing NF-e {:?} for owner {}: {} items, purchase date {}",
            record.invoice_id,
            owner_entity_id,
            items.len(),
            purchase_date
        );

        // 2. 写入 (单个事务)
        let mut tx = self.store.begin().await?;
        let order = NewPurchaseOrder {
            owner_entity_id,
            purchase_date,
            invoice_code: record.invoice_id.clone(),
        };

        match write_order(&mut tx, &order, &items).await {
            Ok(order_id) => {
                tx.commit().await?;
                tracing::info!("NF-e {:?} imported as order {}", record.invoice_id, order_id);
                Ok(order_id)
            }
            Err(e) => {
                tracing::warn!("Import of NF-e {:?} failed, rolling back: {}", record.invoice_id, e);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

async fn write_order<T: CatalogTx>(
    tx: &mut T,
    order: &NewPurchaseOrder,
    items: &[PreparedItem<'_>],
) -> ImportResult<i64> {
    let order_id = tx.create_order(order).await?;

    for (idx, item) in items.iter().enumerate() {
        let product_id = product::resolve(
            tx,
            &ProductDraft {
                name: item.name,
                quantity: item.quantity,
                unit_abbreviation: item.unit_code,
                ean_code: item.ean_code,
                owner_entity_id: order.owner_entity_id,
                expiry_date: item.expiry_date,
            },
        )
        .await?;

        tx.create_order_line_item(&NewOrderLineItem {
            product_id,
            order_id,
            quantity: item.quantity,
            unit_price: item.unit_price.clone(),
        })
        .await?;

        tracing::debug!("Order {} item {}/{} -> product {}", order_id, idx + 1, items.len(), product_id);
    }

    Ok(order_id)
}
