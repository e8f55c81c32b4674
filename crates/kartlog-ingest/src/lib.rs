//! Kartlog Ingest: result-email decoding, track identification and lap extraction.

pub mod cursor;
pub mod extract;
pub mod file;
pub mod metadata;
pub mod mime;
pub mod pipeline;
pub mod track;

pub use cursor::LineCursor;
pub use extract::{default_extractors, Document, LapExtractor};
pub use file::{read_upload, SourceKind};
pub use mime::{DecodedHeaders, DecodedMessage, MessageDecoder};
pub use pipeline::{content_hash, ExtractionPipeline};
pub use track::TrackCatalog;
