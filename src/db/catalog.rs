use crate::db::store::{CatalogStore, CatalogTx};
use crate::error::StoreResult;
use crate::models::{NewOrderLineItem, NewProduct, NewPurchaseOrder};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

/// PostgreSQL 事务 (持有从连接池借出的连接，drop 时自动回滚并归还)
pub struct PgCatalogTx {
    tx: Transaction<'static, Postgres>,
}

impl CatalogStore for PgPool {
    type Tx = PgCatalogTx;

    async fn begin(&self) -> StoreResult<PgCatalogTx> {
        let tx = sqlx::Pool::begin(self).await?;
        Ok(PgCatalogTx { tx })
    }
}

impl CatalogTx for PgCatalogTx {
    async fn find_unit_by_abbreviation(&mut self, abbreviation: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM unit_of_measure
            WHERE abbreviation = $1
            "#,
        )
        .bind(abbreviation)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn create_unit(&mut self, abbreviation: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO unit_of_measure (abbreviation)
            VALUES ($1)
            ON CONFLICT (abbreviation) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(abbreviation)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn find_product_by_ean_and_owner(
        &mut self,
        ean_code: &str,
        owner_entity_id: i64,
    ) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM product
            WHERE ean_code = $1
              AND owner_entity_id = $2
            "#,
        )
        .bind(ean_code)
        .bind(owner_entity_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_product_quantity_and_expiry(
        &mut self,
        product_id: i64,
        quantity: i64,
        expiry_date: Option<NaiveDate>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE product
               SET quantity    = quantity + $1,
                   expiry_date = $2
             WHERE id = $3
            "#,
        )
        .bind(quantity)
        .bind(expiry_date)
        .bind(product_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn create_product(&mut self, product: &NewProduct) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO product (name, quantity, unit_of_measure_id, owner_entity_id, ean_code, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (ean_code, owner_entity_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.unit_of_measure_id)
        .bind(product.owner_entity_id)
        .bind(&product.ean_code)
        .bind(product.expiry_date)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn create_order(&mut self, order: &NewPurchaseOrder) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO purchase_order (owner_entity_id, purchase_date, invoice_code)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(order.owner_entity_id)
        .bind(order.purchase_date)
        .bind(&order.invoice_code)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn create_order_line_item(&mut self, item: &NewOrderLineItem) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO order_line_item (product_id, order_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(item.product_id)
        .bind(item.order_id)
        .bind(item.quantity)
        .bind(&item.unit_price)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::unit;
    use crate::test_utils::{init_test_tracing, pg_test_pool};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    // 测试都在未提交的事务里进行，drop 时回滚，不留数据

    fn new_product(unit_of_measure_id: i64, owner_entity_id: i64, quantity: i64) -> NewProduct {
        NewProduct {
            name: "Leite Integral 1L".into(),
            quantity,
            unit_of_measure_id,
            owner_entity_id,
            ean_code: "7891000100103".into(),
            expiry_date: None,
        }
    }

    async fn stored_price(tx: &mut PgCatalogTx, item_id: i64) -> BigDecimal {
        sqlx::query_scalar::<_, BigDecimal>("SELECT unit_price FROM order_line_item WHERE id = $1")
            .bind(item_id)
            .fetch_one(&mut *tx.tx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unit_price_is_stored_without_rounding() {
        init_test_tracing();
        let Some(pool) = pg_test_pool().await else { return };
        let mut tx = CatalogStore::begin(&pool).await.unwrap();

        let unit_id = unit::resolve(&mut tx, "un").await.unwrap();
        let product_id = tx
            .create_product(&new_product(unit_id, -9_001, 1))
            .await
            .unwrap()
            .unwrap();
        let order_id = tx
            .create_order(&NewPurchaseOrder {
                owner_entity_id: -9_001,
                purchase_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                invoice_code: Some("NFe1".into()),
            })
            .await
            .unwrap();

        for price in ["0.1234567890", "12345678901.25", "4.5900"] {
            let unit_price = BigDecimal::from_str(price).unwrap();
            let item_id = tx
                .create_order_line_item(&NewOrderLineItem {
                    product_id,
                    order_id,
                    quantity: 1,
                    unit_price: unit_price.clone(),
                })
                .await
                .unwrap();
            let stored = stored_price(&mut tx, item_id).await;
            assert_eq!(stored, unit_price);
        }
    }

    #[tokio::test]
    async fn creates_skip_existing_rows_and_updates_add_quantity() {
        init_test_tracing();
        let Some(pool) = pg_test_pool().await else { return };
        let mut tx = CatalogStore::begin(&pool).await.unwrap();

        let abbreviation = "PGTEST-CX";
        let unit_id = tx.create_unit(abbreviation).await.unwrap().unwrap();
        assert_eq!(tx.create_unit(abbreviation).await.unwrap(), None);
        assert_eq!(tx.find_unit_by_abbreviation(abbreviation).await.unwrap(), Some(unit_id));

        let product = new_product(unit_id, -9_002, 5);
        let product_id = tx.create_product(&product).await.unwrap().unwrap();
        assert_eq!(tx.create_product(&product).await.unwrap(), None);
        assert_eq!(
            tx.find_product_by_ean_and_owner("7891000100103", -9_002).await.unwrap(),
            Some(product_id)
        );
        assert_eq!(tx.find_product_by_ean_and_owner("7891000100103", -9_003).await.unwrap(), None);

        let expiry = NaiveDate::from_ymd_opt(2025, 6, 1);
        tx.update_product_quantity_and_expiry(product_id, 7, expiry).await.unwrap();
        let (quantity, expiry_date) = sqlx::query_as::<_, (i64, Option<NaiveDate>)>(
            "SELECT quantity, expiry_date FROM product WHERE id = $1",
        )
        .bind(product_id)
        .fetch_one(&mut *tx.tx)
        .await
        .unwrap();
        assert_eq!(quantity, 12);
        assert_eq!(expiry_date, expiry);

        tx.rollback().await.unwrap();
    }
}
