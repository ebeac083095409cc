pub mod embedding;
pub mod monitor;
pub mod relevance;
