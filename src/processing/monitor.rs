//! Single-shot monitoring run: fetch, dedup, score, notify, persist.

use crate::domain::identity::hash_item;
use crate::domain::item::Item;
use crate::error::{MonitorError, MonitorResult};
use crate::models::config::MonitorConfig;
use crate::notify::Notifier;
use crate::processing::embedding::Embedder;
use crate::processing::relevance::{RelevanceScorer, TopicEncoder};
use crate::repository::HistoryStore;
use crate::sources::SourceFetcher;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    #[default]
    Completed,
    /// No topics were configured; nothing was fetched or persisted.
    NoTopics,
}

/// Counters describing what a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub feeds_total: usize,
    pub feeds_failed: usize,
    pub items_fetched: usize,
    pub skipped_seen: usize,
    pub skipped_invalid: usize,
    pub scored: usize,
    pub scoring_failed: usize,
    pub matched: usize,
    pub notified: usize,
    pub notify_failed: usize,
    pub notification_skipped: bool,
    /// Matched items in fetch order.
    pub matches: Vec<Item>,
}

/// Wires the collaborators of one run together.
pub struct Monitor<'a, E> {
    config: &'a MonitorConfig,
    encoder: &'a mut TopicEncoder<E>,
    history: &'a dyn HistoryStore,
    fetcher: &'a dyn SourceFetcher,
    notifier: &'a dyn Notifier,
    scorer: RelevanceScorer,
}

impl<'a, E: Embedder> Monitor<'a, E> {
    pub fn new(
        config: &'a MonitorConfig,
        encoder: &'a mut TopicEncoder<E>,
        history: &'a dyn HistoryStore,
        fetcher: &'a dyn SourceFetcher,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            encoder,
            history,
            fetcher,
            notifier,
            scorer: RelevanceScorer::new(config.similarity_threshold),
        }
    }

    /// Runs the pipeline once.
    ///
    /// Source failures, unreadable history, unscorable items and a missing
    /// notification target are logged and counted. The run only fails on a
    /// topic embedding error or when the updated history cannot be saved; the
    /// latter is reported after notifications were attempted.
    pub async fn run(&mut self) -> MonitorResult<RunReport> {
        let mut report = RunReport {
            feeds_total: self.config.feeds.len(),
            ..Default::default()
        };

        let mut ledger = self.history.load();

        let topics = match self.encoder.encode(&self.config.topics()) {
            Ok(topics) => topics,
            Err(MonitorError::Configuration(reason)) => {
                log::info!("Nothing to match against ({reason}), exiting");
                report.outcome = RunOutcome::NoTopics;
                return Ok(report);
            }
            Err(e) => return Err(e),
        };
        log::info!("Encoded {} topics", topics.len());

        let mut items = Vec::new();
        for feed in &self.config.feeds {
            log::info!("Fetching {}...", feed.name);
            match self.fetcher.fetch(feed).await {
                Ok(fetched) => {
                    log::debug!("{} returned {} items", feed.name, fetched.len());
                    items.extend(fetched);
                }
                Err(e) => {
                    log::warn!("Error fetching {}: {e}", feed.name);
                    report.feeds_failed += 1;
                }
            }
        }
        report.items_fetched = items.len();

        for item in items {
            let key = match hash_item(&item) {
                Ok(key) => key,
                Err(e) => {
                    log::warn!("Skipping item: {e}");
                    report.skipped_invalid += 1;
                    continue;
                }
            };

            if ledger.contains(&key) {
                report.skipped_seen += 1;
                continue;
            }

            report.scored += 1;
            let score = match self.scorer.score(&mut *self.encoder, &item.title, &topics) {
                Ok(score) => score,
                Err(e) => {
                    log::warn!("Could not score {:?} from {}: {e}", item.title, item.source);
                    report.scoring_failed += 1;
                    continue;
                }
            };

            if self.scorer.is_match(score.similarity) {
                log::info!(
                    "Match found: {} (sim: {:.2}, topic: {})",
                    item.title,
                    score.similarity,
                    score.topic
                );
                // Seen from match time on, whatever the delivery outcome.
                ledger.append(key);
                report.matches.push(item);
            } else {
                log::debug!("No match: {} (sim: {:.2})", item.title, score.similarity);
            }
        }
        report.matched = report.matches.len();

        if !report.matches.is_empty() {
            self.deliver(&mut report).await;
        }

        let saved = self.history.save(&ledger);

        log::info!(
            "Finished run: feeds_total={}, feeds_failed={}, items_fetched={}, skipped_seen={}, skipped_invalid={}, scored={}, scoring_failed={}, matched={}, notified={}, notify_failed={}, notification_skipped={}, history_size={}",
            report.feeds_total,
            report.feeds_failed,
            report.items_fetched,
            report.skipped_seen,
            report.skipped_invalid,
            report.scored,
            report.scoring_failed,
            report.matched,
            report.notified,
            report.notify_failed,
            report.notification_skipped,
            ledger.len().min(crate::HISTORY_CAPACITY),
        );

        if let Err(e) = saved {
            log::error!("Failed to save history: {e}");
            return Err(MonitorError::PersistenceWrite(e));
        }

        Ok(report)
    }

    async fn deliver(&self, report: &mut RunReport) {
        let Some(target) = self.config.output.target() else {
            log::warn!(
                "Skipping notification of {} matches: no discord_channel_id configured",
                report.matches.len()
            );
            report.notification_skipped = true;
            return;
        };

        let result = self.notifier.notify(&report.matches, target).await;
        match result {
            Ok(outcome) => {
                report.notified = outcome.delivered;
                report.notify_failed = outcome.failed;
                if outcome.failed > 0 {
                    log::warn!(
                        "{} of {} notifications failed",
                        outcome.failed,
                        report.matches.len()
                    );
                }
            }
            Err(e) => {
                log::error!("Notification failed: {e}");
                report.notify_failed = report.matches.len();
            }
        }
    }
}
