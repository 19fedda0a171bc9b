// Bibliographic sources, one module per provider.
#[cfg(feature = "arxiv")]
pub mod arxiv;
#[cfg(feature = "pubmed")]
pub mod pubmed;
#[cfg(feature = "semantic-scholar")]
pub mod semantic_scholar;
