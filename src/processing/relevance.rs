//! Topic encoding and title relevance scoring.

use crate::error::{MonitorError, MonitorResult};
use crate::processing::embedding::{CosineIndex, Embedder};

/// Topic labels and the cosine index over their embeddings, built once per
/// run. Index keys are positions in `labels`.
pub struct TopicVectors {
    labels: Vec<String>,
    index: CosineIndex,
}

impl TopicVectors {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Best topic for a title and its cosine similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicScore {
    pub similarity: f32,
    pub topic: String,
}

/// Wraps the embedding model loaded for the run.
pub struct TopicEncoder<E> {
    embedder: E,
}

impl<E: Embedder> TopicEncoder<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    /// Encodes every topic label, keeping the input order.
    ///
    /// An empty topic list is a configuration error: nothing could ever match.
    pub fn encode(&mut self, topics: &[String]) -> MonitorResult<TopicVectors> {
        if topics.is_empty() {
            return Err(MonitorError::Configuration(
                "no positive topics configured".to_string(),
            ));
        }

        let vectors = self.embedder.embed(topics)?;
        if vectors.len() != topics.len() {
            return Err(MonitorError::Embedding(format!(
                "expected {} topic embeddings, got {}",
                topics.len(),
                vectors.len()
            )));
        }

        let index = CosineIndex::build(&vectors).map_err(|error| {
            MonitorError::Embedding(format!("failed to index topic embeddings: {error}"))
        })?;

        Ok(TopicVectors {
            labels: topics.to_vec(),
            index,
        })
    }

    /// Embeds a single text into the topic space.
    pub fn embed_one(&mut self, text: &str) -> MonitorResult<Vec<f32>> {
        self.embedder
            .embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| MonitorError::Embedding(format!("no embedding returned for {text:?}")))
    }
}

/// Decides whether an item title is relevant to the configured topics.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceScorer {
    threshold: f32,
}

impl RelevanceScorer {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Maximum cosine similarity between `title` and any topic, found by an
    /// exhaustive search over the topic index.
    ///
    /// Blank titles cannot be scored and are reported as
    /// [`MonitorError::InvalidInput`].
    pub fn score<E: Embedder>(
        &self,
        encoder: &mut TopicEncoder<E>,
        title: &str,
        topics: &TopicVectors,
    ) -> MonitorResult<TopicScore> {
        if title.trim().is_empty() {
            return Err(MonitorError::InvalidInput("empty title".to_string()));
        }

        let query = encoder.embed_one(title)?;
        let (key, distance) = topics
            .index
            .top_k(&query, 1)
            .map_err(|error| MonitorError::Embedding(format!("similarity search failed: {error}")))?
            .into_iter()
            .next()
            .ok_or_else(|| MonitorError::Embedding("no topic candidates".to_string()))?;

        let topic = usize::try_from(key)
            .ok()
            .and_then(|idx| topics.labels().get(idx))
            .cloned()
            .ok_or_else(|| MonitorError::Embedding(format!("unknown topic index {key}")))?;

        Ok(TopicScore {
            similarity: 1.0 - distance,
            topic,
        })
    }

    pub fn is_match(&self, score: f32) -> bool {
        is_match(score, self.threshold)
    }
}

/// A score matches only when it is strictly above the threshold.
pub fn is_match(score: f32, threshold: f32) -> bool {
    score > threshold
}
