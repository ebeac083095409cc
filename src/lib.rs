pub mod domain;
pub mod error;
pub mod models;
pub mod notify;
pub mod processing;
pub mod repository;
pub mod sources;

/// Default cosine-similarity threshold; a title must score strictly above it.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.4;

/// Embedding model used when the configuration does not name one.
pub const DEFAULT_MODEL_NAME: &str = "paraphrase-multilingual-MiniLM-L12-v2";

/// Maximum number of identity keys kept in the persisted history.
pub const HISTORY_CAPACITY: usize = 500;
