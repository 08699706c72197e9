pub mod coerce;
pub mod importer;
pub mod product;
pub mod unit;

pub use importer::OrderImporter;
pub use product::ProductDraft;
