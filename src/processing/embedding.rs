use std::error::Error;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::error::{MonitorError, MonitorResult};

/// Turns text into fixed-dimension vectors.
pub trait Embedder {
    /// Embeds every text, returning one vector per input in the same order.
    fn embed(&mut self, texts: &[String]) -> MonitorResult<Vec<Vec<f32>>>;
}

/// Local ONNX embedding model backed by fastembed.
pub struct FastEmbedder {
    model: TextEmbedding,
}

impl FastEmbedder {
    /// Loads the model named in the configuration, downloading it on first
    /// use.
    pub fn try_new(model_name: &str) -> MonitorResult<Self> {
        let model = resolve_model(model_name)?;
        log::info!("Loading embedding model {model_name}");
        let model = TextEmbedding::try_new(InitOptions::new(model)).map_err(|error| {
            MonitorError::Configuration(format!(
                "Failed to initialize embedder {model_name}: {error:?}"
            ))
        })?;
        Ok(Self { model })
    }
}

impl Embedder for FastEmbedder {
    fn embed(&mut self, texts: &[String]) -> MonitorResult<Vec<Vec<f32>>> {
        let embeddings = self
            .model
            .embed(texts.to_vec(), None)
            .map_err(|error| MonitorError::Embedding(format!("{error:?}")))?;
        Ok(embeddings
            .iter()
            .map(|value| normalize_embedding(value))
            .collect())
    }
}

/// Maps a configured model name onto a supported fastembed model.
///
/// Names are compared case-insensitively against the last path segment of
/// each model code, so both `paraphrase-multilingual-MiniLM-L12-v2` and
/// `sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2` work. The
/// fastembed variant name (`ParaphraseMLMiniLML12V2`) is accepted too.
pub fn resolve_model(model_name: &str) -> MonitorResult<EmbeddingModel> {
    let wanted = last_segment(model_name).to_lowercase();
    TextEmbedding::list_supported_models()
        .into_iter()
        .find(|info| {
            last_segment(&info.model_code).to_lowercase() == wanted
                || format!("{:?}", info.model).to_lowercase() == wanted
        })
        .map(|info| info.model)
        .ok_or_else(|| {
            MonitorError::Configuration(format!("Unsupported embedding model: {model_name}"))
        })
}

fn last_segment(name: &str) -> &str {
    name.trim().rsplit('/').next().unwrap_or_default()
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub(crate) fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// Cosine index over a fixed set of candidate vectors.
///
/// Keys are the positions of the candidates in the slice the index was built
/// from. Lookups are exhaustive, so the first hit is always the true nearest
/// candidate.
pub(crate) struct CosineIndex {
    index: Index,
    dimensions: usize,
}

impl CosineIndex {
    pub(crate) fn build<T>(items: &[T]) -> Result<Self, Box<dyn Error>>
    where
        T: AsRef<[f32]>,
    {
        let dimensions = match items.first() {
            Some(first) => first.as_ref().len(),
            None => return Err("cannot index an empty candidate set".into()),
        };
        if let Some(bad) = items.iter().find(|item| item.as_ref().len() != dimensions) {
            return Err(format!(
                "dimension mismatch: expected {dimensions}, candidate has {}",
                bad.as_ref().len()
            )
            .into());
        }

        let index = Index::new(&IndexOptions {
            dimensions,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            ..Default::default()
        })?;

        index.reserve(items.len())?;

        for (id, embedding) in items.iter().enumerate() {
            index.add(id as u64, embedding.as_ref())?;
        }

        Ok(Self { index, dimensions })
    }

    /// The `k` closest candidates to `query` as `(key, cosine distance)`,
    /// nearest first.
    pub(crate) fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>, Box<dyn Error>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(format!(
                "dimension mismatch: query has {}, index has {}",
                query.len(),
                self.dimensions
            )
            .into());
        }

        let neighbors = self.index.exact_search(query, k)?;

        let results: Vec<(u64, f32)> = neighbors
            .keys
            .iter()
            .zip(neighbors.distances.iter())
            .map(|(&key, &distance)| (key, distance))
            .collect();

        Ok(results)
    }
}
