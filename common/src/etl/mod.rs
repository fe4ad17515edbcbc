// ETL module: fetch, normalize, validate and commit source records

pub mod coercion;
pub mod committer;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;
pub mod validator;

pub use coercion::{coerce, parse_timestamp};
pub use committer::{PgRowCommitter, RowCommitter};
pub use fetcher::{HttpSourceFetcher, SourceFetcher};
pub use normalizer::normalize;
pub use pipeline::{EtlPipeline, PipelineStage};
pub use validator::{validate_identifier, RowValidator};
