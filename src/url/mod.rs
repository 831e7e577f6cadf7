//! URL handling module for Catalog-Sweep
//!
//! This module resolves raw hrefs and manual-name markers into absolute
//! links, and decides which candidates count as documents.

mod normalize;

pub use normalize::{
    is_document_candidate, resolve_document_href, resolve_link, resolve_manual_name,
    DOCUMENT_EXTENSION,
};
