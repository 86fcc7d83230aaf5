//! SessionController: the single owner of one operator session.
//!
//! Owns the roster store, view state, history and notifications, and wires an
//! acquisition result into all of them: a snapshot goes to the enrichment
//! pipeline, its address goes to the history, and either outcome becomes one
//! notification. Only acquisition failures are ever shown to the operator.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::acquisition::RosterClient;
use crate::config::Config;
use crate::enrichment::{EnrichmentPipeline, EnrichmentReport};
use crate::error::AcquisitionError;
use crate::history::{make_address, HistoryStore};
use crate::identity::{AvatarResolver, HttpAvatarResolver};
use crate::model::{EnrichedPlayer, RosterSnapshot};
use crate::notify::NotificationQueue;
use crate::roster::{EnrichedRoster, RosterStore};
use crate::view::{self, PageView, ViewState};

pub struct SessionController<R = HttpAvatarResolver> {
    client: RosterClient,
    pipeline: Arc<EnrichmentPipeline<R>>,
    store: RosterStore,
    history: HistoryStore,
    notifications: NotificationQueue,
    view: ViewState,
    selected: Option<u32>,
    /// Most recent enrichment run. Older runs are left to finish on their own;
    /// the store rejects their merges.
    enrichment: Option<JoinHandle<EnrichmentReport>>,
    /// Ticket of the most recently started acquisition.
    latest_ticket: u64,
}

impl SessionController<HttpAvatarResolver> {
    pub fn from_config(config: &Config, history: HistoryStore) -> Self {
        let http = reqwest::Client::new();
        let client = RosterClient::with_client(http.clone(), &config.acquisition);
        let resolver = HttpAvatarResolver::with_client(http, &config.identity);
        let pipeline = EnrichmentPipeline::new(resolver, &config.identity, &config.enrichment);
        Self::new(client, pipeline, history)
    }
}

impl<R: AvatarResolver> SessionController<R> {
    pub fn new(client: RosterClient, pipeline: EnrichmentPipeline<R>, history: HistoryStore) -> Self {
        Self {
            client,
            pipeline: Arc::new(pipeline),
            store: RosterStore::new(),
            history,
            notifications: NotificationQueue::new(),
            view: ViewState::default(),
            selected: None,
            enrichment: None,
            latest_ticket: 0,
        }
    }

    /// Cheap clone of the roster client, for fetching off the owner's task.
    pub fn client(&self) -> RosterClient {
        self.client.clone()
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationQueue {
        &mut self.notifications
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn set_search_name(&mut self, query: impl Into<String>) {
        self.view.set_search_name(query);
    }

    pub fn set_search_id(&mut self, query: impl Into<String>) {
        self.view.set_search_id(query);
    }

    pub fn set_page(&mut self, page: usize) {
        self.view.set_page(page);
    }

    pub fn next_page(&mut self) {
        self.view.next_page();
    }

    pub fn prev_page(&mut self) {
        self.view.prev_page();
    }

    pub fn select(&mut self, player_id: Option<u32>) {
        self.selected = player_id;
    }

    pub fn selected_id(&self) -> Option<u32> {
        self.selected
    }

    /// Fetch `host:port` and apply the result. Blocks the caller for the
    /// whole route chain; the TUI fetches on a spawned task and calls
    /// `complete_acquisition` instead.
    pub async fn acquire(&mut self, host: &str, port: u16) -> Result<u64, AcquisitionError> {
        self.begin_acquisition();
        let result = self.client.fetch_roster(host, port).await;
        self.apply_acquisition(host, port, result).await
    }

    /// Start a new acquisition and return its ticket. Every fetch started
    /// earlier is superseded from this point on.
    pub fn begin_acquisition(&mut self) -> u64 {
        self.latest_ticket += 1;
        self.latest_ticket
    }

    /// Apply the outcome of the fetch started as `ticket`.
    ///
    /// Returns `Ok(None)` without touching anything when a newer acquisition
    /// has started since; the outcome of a superseded fetch is discarded
    /// whether it succeeded or failed.
    pub async fn complete_acquisition(
        &mut self,
        ticket: u64,
        host: &str,
        port: u16,
        result: Result<RosterSnapshot, AcquisitionError>,
    ) -> Result<Option<u64>, AcquisitionError> {
        if ticket < self.latest_ticket {
            debug!(
                "[session] discarding {}:{} (ticket {} < {})",
                host.trim(),
                port,
                ticket,
                self.latest_ticket
            );
            return Ok(None);
        }
        self.apply_acquisition(host, port, result).await.map(Some)
    }

    /// On success the roster is replaced and published before this returns,
    /// enrichment starts in the background, the address is recorded and a
    /// success notification is raised. On failure nothing but the
    /// notification queue changes.
    async fn apply_acquisition(
        &mut self,
        host: &str,
        port: u16,
        result: Result<RosterSnapshot, AcquisitionError>,
    ) -> Result<u64, AcquisitionError> {
        match result {
            Ok(snapshot) => {
                let count = snapshot.player_count();
                let (generation, handle) = self.pipeline.enrich(&self.store, snapshot).await;
                self.enrichment = Some(handle);
                self.selected = None;
                self.history.record(&make_address(host, port));
                self.notifications
                    .success(format!("Found {} players", count));
                info!(
                    "[session] {}:{} -> {} players (generation {})",
                    host.trim(),
                    port,
                    count,
                    generation
                );
                Ok(generation)
            }
            Err(e) => {
                warn!("[session] acquisition of {}:{} failed: {}", host.trim(), port, e);
                self.notifications.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Wait for the latest enrichment run to finish.
    pub async fn settle(&mut self) -> Option<EnrichmentReport> {
        let handle = self.enrichment.take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("[session] enrichment task ended abnormally: {}", e);
                None
            }
        }
    }

    pub async fn roster(&self) -> EnrichedRoster {
        self.store.snapshot().await
    }

    /// Project the current roster and pull the stored page back into range.
    pub async fn page_view(&mut self) -> PageView {
        let roster = self.store.snapshot().await;
        self.project(&roster)
    }

    /// Same as `page_view` for a roster the caller already holds.
    pub fn project(&mut self, roster: &EnrichedRoster) -> PageView {
        let page = view::project(roster, &self.view);
        self.view.clamp(page.matched);
        page
    }

    /// The selected player as currently enriched, so a late avatar shows up.
    pub async fn selected_player(&self) -> Option<EnrichedPlayer> {
        let id = self.selected?;
        self.store.snapshot().await.get(id).cloned()
    }

    /// Expire old notifications. Call on a regular tick.
    pub fn tick(&mut self) {
        self.notifications.tick();
    }
}
