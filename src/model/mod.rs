//! Data model shared by the extraction pipeline
//!
//! - [`ProductReference`]: one product found on the listing
//! - [`AttributeRecord`]: the fixed attribute set of one product
//! - [`DocumentLink`] and [`DedupMode`]: discovered manuals and how they are collapsed
//! - [`ProductDetails`]: everything extracted from one detail page

mod attributes;
mod documents;
mod product;

pub use attributes::{AttributeRecord, Field, NOT_AVAILABLE};
pub use documents::{DedupMode, DocumentLink};
pub use product::{ProductDetails, ProductReference};
