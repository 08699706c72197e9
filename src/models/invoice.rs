use serde::{Deserialize, Serialize};

/// 从 NF-e XML 提取出的发票 (只读，入库时一次性消费)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_id: Option<String>, // infNFe@Id
    pub issued_at: String,          // ide/dhEmi，缺失时为空串
    pub line_items: Vec<LineItem>,
}

/// 发票明细行，数值和日期保持原始文本，入库时再转换
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_name: String,        // xProd
    pub unit_code: String,           // uCom
    pub quantity: String,            // qCom
    pub unit_price: String,          // vUnCom
    pub total_price: String,         // vProd
    pub ean_code: String,            // cEAN
    pub expiry_date: Option<String>, // rastro/dVal，无 rastro 时为 None
}
