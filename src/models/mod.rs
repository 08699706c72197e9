pub mod catalog;
pub mod invoice;
pub mod order;

pub use catalog::{NewProduct, Product, UnitOfMeasure};
pub use invoice::{InvoiceRecord, LineItem};
pub use order::{NewOrderLineItem, NewPurchaseOrder, OrderItemView, OrderLineItem, PurchaseOrder};
