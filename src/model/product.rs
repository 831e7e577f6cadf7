//! Product references and extracted details

use crate::model::{AttributeRecord, DocumentLink};
use url::Url;

/// A product found on the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReference {
    /// Display name, used for the artifact folder
    pub name: String,

    /// Absolute URL of the product detail page (unique per traversal)
    pub detail_url: Url,
}

impl ProductReference {
    pub fn new(name: impl Into<String>, detail_url: Url) -> Self {
        Self {
            name: name.into(),
            detail_url,
        }
    }
}

/// Everything extracted from one product detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    /// The fixed attribute set
    pub attributes: AttributeRecord,

    /// Document links, already deduplicated per the selected mode
    pub documents: Vec<DocumentLink>,

    /// The detail page the data came from
    pub source_url: Url,
}

impl ProductDetails {
    /// The "no data" result used when a detail page cannot be loaded
    pub fn empty(source_url: Url) -> Self {
        Self {
            attributes: AttributeRecord::new(),
            documents: Vec::new(),
            source_url,
        }
    }
}
