//! Vector index: exact search, persistence and the build pipeline.

pub mod builder;
pub mod distance;
pub mod flat;
pub mod store;

pub use builder::{BuildReport, IndexBuilder, SkippedDocument};
pub use flat::FlatIndex;
pub use store::{index_exists, load, load_for, persist, read_header, IndexHeader};
