//! Clients for the remote catalog: the paginated bulk search endpoint and
//! the per-series detail endpoint.

mod detail;
mod pages;
mod types;

pub use detail::DetailEnricher;
pub use pages::PageFetcher;
pub use types::SearchRequestBody;
