// Repository layer for the metadata store and refresh audit log

pub mod refresh_log;
pub mod table_metadata;

pub use refresh_log::RefreshLogRepository;
pub use table_metadata::TableMetadataRepository;
