pub mod document_store;
pub mod legacy_store;

pub use document_store::{DocumentStore, HttpDocumentStore, ReadOptions};
pub use legacy_store::{
    FileLegacyStore, LegacyStore, LEGACY_ASSESSMENTS_KEY, LEGACY_SESSIONS_KEY,
};
