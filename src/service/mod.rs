mod bulk;
mod catalog_service;

pub use bulk::{BulkItem, BulkItemError, BulkSummary};
pub(crate) use bulk::string_field;
pub use catalog_service::{
    coerce_positive, CatalogError, CatalogResult, CatalogService, CreateMusicRequest,
    DEFAULT_BULK_BATCH_SIZE, DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, SEARCH_RESULTS_LIMIT,
};
