//! NF-e XML 提取
//!
//! 只读取导入需要的固定字段子集 (发票号、开票时间、商品明细)，
//! 不做 schema 校验；可选字段缺失时以空串代替，只有 XML 本身不合法才报错。

mod tree;

use crate::error::ImportResult;
use crate::models::{InvoiceRecord, LineItem};
use tree::Element;

/// NF-e 命名空间
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// 将 NF-e XML 解析为 InvoiceRecord
pub fn extract(xml: &[u8]) -> ImportResult<InvoiceRecord> {
    let root = tree::parse(xml)?;
    let inf_nfe = root.find(NFE_NAMESPACE, "infNFe");

    let invoice_id = inf_nfe
        .and_then(|inf| inf.attribute("Id"))
        .map(str::to_string);

    let issued_at = inf_nfe
        .and_then(|inf| {
            inf.descendants()
                .filter(|e| e.is(NFE_NAMESPACE, "ide"))
                .find_map(|ide| ide.child(NFE_NAMESPACE, "dhEmi"))
        })
        .map(|dh| dh.text.clone())
        .unwrap_or_default();

    let line_items: Vec<LineItem> = root
        .descendants()
        .filter(|e| e.is(NFE_NAMESPACE, "det"))
        .filter_map(line_item)
        .collect();

    tracing::debug!(
        "Extracted NF-e {:?}: issued_at={:?}, {} line items",
        invoice_id,
        issued_at,
        line_items.len()
    );

    Ok(InvoiceRecord {
        invoice_id,
        issued_at,
        line_items,
    })
}

/// 单个 det 节点 -> 明细行；没有 prod 子节点的 det 跳过
fn line_item(det: &Element) -> Option<LineItem> {
    let prod = det.child(NFE_NAMESPACE, "prod")?;
    let text = |tag: &str| prod.child_text(NFE_NAMESPACE, tag).to_string();

    // 批次追踪信息 (药品、食品等)
    let expiry_date = det
        .find(NFE_NAMESPACE, "rastro")
        .map(|rastro| rastro.child_text(NFE_NAMESPACE, "dVal").to_string());

    Some(LineItem {
        product_name: text("xProd"),
        unit_code: text("uCom"),
        quantity: text("qCom"),
        unit_price: text("vUnCom"),
        total_price: text("vProd"),
        ean_code: text("cEAN"),
        expiry_date,
    })
}
