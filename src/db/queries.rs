use crate::models::{OrderItemView, PurchaseOrder};
use sqlx::PgPool;
use std::io::Write;

/// 查询某主体的采购单 (按采购日期倒序)
pub async fn list_orders_by_owner(
    pool: &PgPool,
    owner_entity_id: i64,
) -> Result<Vec<PurchaseOrder>, sqlx::Error> {
    sqlx::query_as::<_, PurchaseOrder>(
        r#"
        SELECT id, owner_entity_id, purchase_date, invoice_code
        FROM purchase_order
        WHERE owner_entity_id = $1
        ORDER BY purchase_date DESC, id DESC
        "#
    )
    .bind(owner_entity_id)
    .fetch_all(pool)
    .await
}

/// 查询采购单明细 (带商品名称和品牌)
pub async fn list_order_items(
    pool: &PgPool,
    order_id: i64,
) -> Result<Vec<OrderItemView>, sqlx::Error> {
    sqlx::query_as::<_, OrderItemView>(
        r#"
        SELECT oli.id,
               oli.order_id,
               oli.product_id,
               p.name as product_name,
               p.brand,
               oli.quantity,
               oli.unit_price
        FROM order_line_item oli
        INNER JOIN product p ON p.id = oli.product_id
        WHERE oli.order_id = $1
        ORDER BY oli.id
        "#
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

/// 导出采购单明细为 CSV (带表头)
pub fn export_order_items_csv<W: Write>(
    items: &[OrderItemView],
    out: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "order_id",
        "product_id",
        "product_name",
        "brand",
        "quantity",
        "unit_price",
    ])?;

    for item in items {
        writer.write_record(&[
            item.order_id.to_string(),
            item.product_id.to_string(),
            item.product_name.clone(),
            item.brand.clone().unwrap_or_default(),
            item.quantity.to_string(),
            item.unit_price.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
