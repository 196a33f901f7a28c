pub mod archive;
pub mod assets;
pub mod cache;
pub mod client;
pub mod error;
pub mod extractor;

pub use archive::ArchiveResolver;
pub use assets::AssetScanner;
pub use cache::{CacheKey, FetchCache, ResourceKind};
pub use client::build_client;
pub use error::ScanError;
pub use extractor::{Extraction, PatternTable, StaticExtractor};
