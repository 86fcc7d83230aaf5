//! Enrichment pipeline: attaches avatars to an already-published roster.
//!
//! ## Flow
//!
//!   1. Project the snapshot synchronously and publish it through
//!      `RosterStore::replace` (which hands back the run's generation).
//!   2. Queue every player that has an external id, in roster order.
//!   3. Resolve the queue in fixed-size batches: lookups inside a batch run
//!      concurrently, batches run one after another with a short pause in
//!      between to keep the lookup service happy.
//!   4. Merge each settled batch into the store, tagged with the generation.
//!      A rejected merge means a newer acquisition replaced the roster; the
//!      run stops there and launches nothing further.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{EnrichmentConfig, IdentityConfig};
use crate::identity::AvatarResolver;
use crate::model::{extract_external_id, RosterSnapshot};
use crate::roster::RosterStore;

/// Outcome of one enrichment run, mostly for logs and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentReport {
    pub generation: u64,
    pub queued: usize,
    pub batches_merged: usize,
    pub resolved: usize,
    /// The run was superseded and its remaining results were dropped.
    pub superseded: bool,
}

pub struct EnrichmentPipeline<R> {
    resolver: Arc<R>,
    prefixes: Vec<String>,
    batch_size: usize,
    batch_pause: Duration,
}

impl<R: AvatarResolver> EnrichmentPipeline<R> {
    pub fn new(resolver: R, identity: &IdentityConfig, config: &EnrichmentConfig) -> Self {
        Self {
            resolver: Arc::new(resolver),
            prefixes: identity.prefixes.clone(),
            batch_size: config.batch_size.max(1),
            batch_pause: config.batch_pause(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// `(player id, external id)` for every player that can be looked up,
    /// in the order the server listed them.
    pub fn lookup_queue(&self, snapshot: &RosterSnapshot) -> Vec<(u32, String)> {
        snapshot
            .players
            .iter()
            .filter_map(|p| extract_external_id(&p.identifiers, &self.prefixes).map(|e| (p.id, e)))
            .collect()
    }

    /// Publish the base roster now and resolve avatars in the background.
    ///
    /// Returns the generation the roster was published under and a handle to
    /// the background run.
    pub async fn enrich(
        self: &Arc<Self>,
        store: &RosterStore,
        snapshot: RosterSnapshot,
    ) -> (u64, JoinHandle<EnrichmentReport>) {
        let queue = self.lookup_queue(&snapshot);
        let generation = store.replace(snapshot, &self.prefixes).await;

        let pipeline = Arc::clone(self);
        let store = store.clone();
        let handle = tokio::spawn(async move { pipeline.run(&store, generation, queue).await });
        (generation, handle)
    }

    /// Resolve `queue` batch by batch, merging into `store` under `generation`.
    pub async fn run(
        &self,
        store: &RosterStore,
        generation: u64,
        queue: Vec<(u32, String)>,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport {
            generation,
            queued: queue.len(),
            ..EnrichmentReport::default()
        };

        for (n, batch) in queue.chunks(self.batch_size).enumerate() {
            if n > 0 {
                tokio::time::sleep(self.batch_pause).await;
            }

            let lookups: Vec<_> = batch
                .iter()
                .cloned()
                .map(|(player_id, external_id)| {
                    let resolver = Arc::clone(&self.resolver);
                    async move {
                        let avatar = resolver.resolve(&external_id).await;
                        (player_id, avatar)
                    }
                })
                .collect();
            let resolved: Vec<(u32, String)> = join_all(lookups).await;

            if !store.merge_avatars(generation, &resolved).await {
                debug!(
                    "[enrich] generation {} superseded after {} batch(es)",
                    generation, report.batches_merged
                );
                report.superseded = true;
                return report;
            }
            report.batches_merged += 1;
            report.resolved += resolved.len();
        }

        info!(
            "[enrich] generation {}: {} avatar(s) in {} batch(es)",
            generation, report.resolved, report.batches_merged
        );
        report
    }
}
