//! Federated search across the bibliographic sources.
//!
//! This module provides:
//! - `Study`: the normalized record every source produces
//! - `SourceSelection`: one source or all of them
//! - `FederatedSearch`: engine for parallel multi-source search with
//!   title deduplication
//!
//! # Example
//!
//! ```ignore
//! use quarry_core::federated::{FederatedSearch, SourceSelection};
//!
//! let engine = FederatedSearch::new(Arc::new(registry));
//! let studies = engine
//!     .search_all(&queries, SourceSelection::All, 10)
//!     .await;
//! ```

mod engine;
mod types;

pub use engine::{dedupe_by_title, FederatedSearch, DEFAULT_SOURCE_TIMEOUT};
pub use types::{
    FederatedSearchResult, Source, SourceError, SourceSelection, Study, NO_ABSTRACT, NO_TITLE,
    UNKNOWN_DATE,
};
