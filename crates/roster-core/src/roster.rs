//! RosterStore: owner of the live enriched roster.
//!
//! The roster is rebuilt wholesale from each snapshot and then patched by
//! enrichment merges. Every rebuild bumps `generation`; every merge names the
//! generation it was computed for and is dropped if that is no longer current.
//! Merges happen under the write lock, so readers only ever see whole players.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::model::{EnrichedPlayer, RosterSnapshot};

const EVENT_CAPACITY: usize = 256;

/// Enriched roster keyed (and therefore ordered) by player id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedRoster {
    /// Which acquisition this roster came from. 0 = nothing fetched yet.
    pub generation: u64,
    /// Bumped on every mutation, including merges.
    pub rev: u64,
    pub dynamic_info: serde_json::Value,
    pub players: BTreeMap<u32, EnrichedPlayer>,
}

impl EnrichedRoster {
    /// Synchronous projection of a snapshot; no avatars yet.
    pub fn from_snapshot(snapshot: RosterSnapshot, generation: u64, prefixes: &[String]) -> Self {
        let players = snapshot
            .players
            .into_iter()
            .map(|p| (p.id, EnrichedPlayer::project(p, prefixes)))
            .collect();
        Self {
            generation,
            rev: 1,
            dynamic_info: snapshot.dynamic_info,
            players,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn ids(&self) -> BTreeSet<u32> {
        self.players.keys().copied().collect()
    }

    pub fn get(&self, id: u32) -> Option<&EnrichedPlayer> {
        self.players.get(&id)
    }

    /// Apply resolved avatars by id. Unknown ids are ignored; the id set never
    /// changes. Returns how many players were updated.
    pub fn apply_avatars(&mut self, resolved: &[(u32, String)]) -> usize {
        let mut applied = 0;
        for (id, avatar) in resolved {
            if let Some(player) = self.players.get_mut(id) {
                player.avatar_ref = Some(avatar.clone());
                applied += 1;
            }
        }
        if applied > 0 {
            self.rev += 1;
        }
        applied
    }
}

/// Published after every change to the roster.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterEvent {
    /// A new snapshot replaced the roster.
    Replaced { generation: u64, players: usize },
    /// An enrichment batch was merged.
    Enriched { generation: u64, updated: usize },
}

#[derive(Clone)]
pub struct RosterStore {
    state: Arc<RwLock<EnrichedRoster>>,
    events: broadcast::Sender<RosterEvent>,
}

impl RosterStore {
    pub fn new() -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(EnrichedRoster::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    /// Clone of the current roster, taken under the read lock.
    pub async fn snapshot(&self) -> EnrichedRoster {
        self.state.read().await.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Replace the roster with a fresh projection of `snapshot` and return
    /// its generation. Any merge still in flight for an older generation
    /// will be discarded from here on.
    pub async fn replace(&self, snapshot: RosterSnapshot, prefixes: &[String]) -> u64 {
        let (generation, players) = {
            let mut state = self.state.write().await;
            let generation = state.generation + 1;
            *state = EnrichedRoster::from_snapshot(snapshot, generation, prefixes);
            (generation, state.len())
        };
        let _ = self
            .events
            .send(RosterEvent::Replaced { generation, players });
        generation
    }

    /// Merge resolved avatars if `generation` is still current.
    /// Returns `false` when the merge was discarded as stale.
    pub async fn merge_avatars(&self, generation: u64, resolved: &[(u32, String)]) -> bool {
        let updated = {
            let mut state = self.state.write().await;
            if state.generation != generation {
                debug!(
                    "[roster] discarding {} avatar(s) from stale generation {} (current {})",
                    resolved.len(),
                    generation,
                    state.generation
                );
                return false;
            }
            state.apply_avatars(resolved)
        };
        let _ = self
            .events
            .send(RosterEvent::Enriched { generation, updated });
        true
    }
}

impl Default for RosterStore {
    fn default() -> Self {
        Self::new()
    }
}
