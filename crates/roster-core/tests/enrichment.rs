mod common;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use roster_core::config::{EnrichmentConfig, IdentityConfig, Route};
use roster_core::enrichment::EnrichmentPipeline;
use roster_core::history::HistoryStore;
use roster_core::identity::{AvatarResolver, HttpAvatarResolver};
use roster_core::model::{Player, RosterSnapshot};
use roster_core::{RosterClient, RosterEvent, RosterStore, SessionController};

/// Answers `<tag>:<external id>` after a fixed delay and records how many
/// lookups were in flight at once.
#[derive(Clone)]
struct SlowResolver {
    delay: Duration,
    in_flight: Arc<Mutex<(usize, usize)>>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl SlowResolver {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: Arc::new(Mutex::new((0, 0))),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn max_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().1
    }
}

impl AvatarResolver for SlowResolver {
    async fn resolve(&self, external_id: &str) -> String {
        {
            let mut guard = self.in_flight.lock().unwrap();
            guard.0 += 1;
            guard.1 = guard.1.max(guard.0);
        }
        self.seen.lock().unwrap().push(external_id.to_string());
        tokio::time::sleep(self.delay).await;
        self.in_flight.lock().unwrap().0 -= 1;
        format!("avatar:{}", external_id)
    }
}

/// Answers immediately and records when each lookup started and finished.
#[derive(Clone, Default)]
struct TimedResolver {
    spans: Arc<Mutex<Vec<(String, Instant, Instant)>>>,
}

impl AvatarResolver for TimedResolver {
    async fn resolve(&self, external_id: &str) -> String {
        let started = Instant::now();
        tokio::task::yield_now().await;
        self.spans
            .lock()
            .unwrap()
            .push((external_id.to_string(), started, Instant::now()));
        format!("avatar:{}", external_id)
    }
}

fn snapshot(players: &[(u32, &str)]) -> RosterSnapshot {
    RosterSnapshot {
        dynamic_info: serde_json::Value::Null,
        players: players
            .iter()
            .map(|(id, ident)| Player {
                id: *id,
                name: format!("player{}", id),
                ping: 40,
                identifiers: vec![ident.to_string()],
                endpoint: String::new(),
            })
            .collect(),
    }
}

fn pipeline<R: AvatarResolver>(resolver: R) -> EnrichmentPipeline<R> {
    EnrichmentPipeline::new(
        resolver,
        &IdentityConfig::default(),
        &EnrichmentConfig {
            batch_size: 5,
            batch_pause_ms: 20,
        },
    )
}

#[tokio::test]
async fn test_session_streams_avatars_after_publish() {
    let (addr, _log) = common::spawn_server().await;
    let acquisition = roster_core::config::AcquisitionConfig {
        endpoint: format!("http://{}/fivem/", addr),
        routes: vec![Route::Direct],
        ..Default::default()
    };
    let identity = IdentityConfig {
        lookup_url: format!("http://{}/a.php?user_id={{id}}", addr),
        ..IdentityConfig::default()
    };
    let resolver = HttpAvatarResolver::new(&identity).with_timeout(Duration::from_millis(500));
    let mut session = SessionController::new(
        RosterClient::new(&acquisition),
        EnrichmentPipeline::new(resolver, &identity, &EnrichmentConfig::default()),
        HistoryStore::in_memory(),
    );

    let generation = session.acquire("1.2.3.4", 30120).await.unwrap();

    // Published before any lookup settles.
    let roster = session.roster().await;
    assert_eq!(roster.generation, generation);
    assert_eq!(roster.ids(), BTreeSet::from([2, 7, 12]));
    assert!(roster.players.values().all(|p| p.avatar_ref.is_none()));
    assert_eq!(roster.get(7).unwrap().external_id.as_deref(), Some("55"));

    let report = session.settle().await.unwrap();
    assert!(!report.superseded);
    assert_eq!(report.queued, 2);

    let roster = session.roster().await;
    assert_eq!(
        roster.get(7).unwrap().avatar_ref.as_deref(),
        Some("https://cdn.discordapp.com/avatars/55/a1b2c3.png")
    );
    assert_eq!(
        roster.get(12).unwrap().avatar_ref.as_deref(),
        Some("https://cdn.discordapp.com/avatars/1200/avatar.png")
    );
    assert_eq!(roster.get(2).unwrap().avatar_ref, None);
}

#[tokio::test]
async fn test_newer_acquisition_discards_older_run() {
    let resolver = SlowResolver::new(Duration::from_millis(100));
    let pipeline = Arc::new(pipeline(resolver));
    let store = RosterStore::new();

    let (gen_a, run_a) = pipeline
        .enrich(&store, snapshot(&[(1, "discord:a1"), (2, "discord:a2")]))
        .await;
    let (gen_b, run_b) = pipeline
        .enrich(&store, snapshot(&[(1, "discord:b1"), (2, "discord:b2")]))
        .await;
    assert!(gen_b > gen_a);

    let report_a = run_a.await.unwrap();
    let report_b = run_b.await.unwrap();
    assert!(report_a.superseded);
    assert_eq!(report_a.batches_merged, 0);
    assert!(!report_b.superseded);
    assert_eq!(report_b.resolved, 2);

    let roster = store.snapshot().await;
    assert_eq!(roster.generation, gen_b);
    assert_eq!(roster.get(1).unwrap().avatar_ref.as_deref(), Some("avatar:b1"));
    assert_eq!(roster.get(2).unwrap().avatar_ref.as_deref(), Some("avatar:b2"));
}

#[tokio::test]
async fn test_session_supersession_keeps_latest_roster() {
    let resolver = SlowResolver::new(Duration::from_millis(100));
    let mut session = SessionController::new(
        RosterClient::new(&Default::default()),
        pipeline(resolver),
        HistoryStore::in_memory(),
    );

    let first = snapshot(&[(1, "discord:a1"), (2, "discord:a2")]);
    let second = snapshot(&[(1, "discord:b1"), (3, "license:x")]);
    let ticket = session.begin_acquisition();
    session
        .complete_acquisition(ticket, "10.0.0.1", 30120, Ok(first))
        .await
        .unwrap();
    let ticket = session.begin_acquisition();
    session
        .complete_acquisition(ticket, "10.0.0.2", 30120, Ok(second))
        .await
        .unwrap();
    session.settle().await.unwrap();
    // Let the superseded run reach its merge and be rejected.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let roster = session.roster().await;
    assert_eq!(roster.ids(), BTreeSet::from([1, 3]));
    assert_eq!(roster.get(1).unwrap().avatar_ref.as_deref(), Some("avatar:b1"));
    assert_eq!(roster.get(3).unwrap().avatar_ref, None);
    assert!(roster
        .players
        .values()
        .filter_map(|p| p.avatar_ref.as_deref())
        .all(|avatar| !avatar.starts_with("avatar:a")));
    assert_eq!(session.history().list()[0].address, "10.0.0.2:30120");
}

#[tokio::test]
async fn test_enrichment_never_changes_the_id_set() {
    let resolver = SlowResolver::new(Duration::from_millis(5));
    let pipeline = Arc::new(pipeline(resolver));
    let store = RosterStore::new();
    let mut events = store.subscribe();

    let players: Vec<(u32, String)> = (1..=12).map(|i| (i, format!("discord:{}", i))).collect();
    let refs: Vec<(u32, &str)> = players.iter().map(|(i, s)| (*i, s.as_str())).collect();
    let (generation, run) = pipeline.enrich(&store, snapshot(&refs)).await;
    let expected: BTreeSet<u32> = (1..=12).collect();

    assert_eq!(
        events.recv().await.unwrap(),
        RosterEvent::Replaced {
            generation,
            players: 12
        }
    );

    let mut merged = 0;
    while merged < 3 {
        match events.recv().await.unwrap() {
            RosterEvent::Enriched { generation: g, .. } => {
                assert_eq!(g, generation);
                assert_eq!(store.snapshot().await.ids(), expected);
                merged += 1;
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    let report = run.await.unwrap();
    assert_eq!(report.batches_merged, 3);
    assert_eq!(report.resolved, 12);
}

#[tokio::test]
async fn test_batches_run_sequentially_in_roster_order() {
    let resolver = SlowResolver::new(Duration::from_millis(30));
    let tracker = resolver.clone();
    let pipeline = Arc::new(pipeline(resolver));
    let store = RosterStore::new();

    // Player 4 has no external id and is never queued.
    let snap = snapshot(&[
        (10, "discord:10"),
        (3, "discord:3"),
        (4, "steam:4"),
        (8, "discord:8"),
        (1, "discord:1"),
        (6, "discord:6"),
        (2, "discord:2"),
        (9, "discord:9"),
    ]);
    let (_, run) = pipeline.enrich(&store, snap).await;
    let report = run.await.unwrap();

    assert_eq!(report.queued, 7);
    assert_eq!(report.batches_merged, 2);
    assert_eq!(tracker.max_in_flight(), 5);

    let seen = tracker.seen.lock().unwrap().clone();
    let first_batch: BTreeSet<_> = seen[..5].iter().cloned().collect();
    let second_batch: BTreeSet<_> = seen[5..].iter().cloned().collect();
    assert_eq!(
        first_batch,
        ["10", "3", "8", "1", "6"].iter().map(|s| s.to_string()).collect()
    );
    assert_eq!(
        second_batch,
        ["2", "9"].iter().map(|s| s.to_string()).collect()
    );
    assert_eq!(store.snapshot().await.get(4).unwrap().avatar_ref, None);
}

#[tokio::test]
async fn test_batches_are_separated_by_pause() {
    let resolver = TimedResolver::default();
    let spans = Arc::clone(&resolver.spans);
    let pause = Duration::from_millis(50);
    let pipeline = Arc::new(EnrichmentPipeline::new(
        resolver,
        &IdentityConfig::default(),
        &EnrichmentConfig {
            batch_size: 2,
            batch_pause_ms: 50,
        },
    ));
    let store = RosterStore::new();

    let snap = snapshot(&[
        (1, "discord:1"),
        (2, "discord:2"),
        (3, "discord:3"),
        (4, "discord:4"),
        (5, "discord:5"),
    ]);
    let (_, run) = pipeline.enrich(&store, snap).await;
    let report = run.await.unwrap();
    assert_eq!(report.batches_merged, 3);

    let spans = spans.lock().unwrap().clone();
    assert_eq!(spans.len(), 5);
    let batches: Vec<&[(String, Instant, Instant)]> = spans.chunks(2).collect();
    for pair in batches.windows(2) {
        let previous_settled = pair[0].iter().map(|(_, _, done)| *done).max().unwrap();
        let next_started = pair[1].iter().map(|(_, start, _)| *start).min().unwrap();
        assert!(
            next_started.duration_since(previous_settled) >= pause,
            "batch started {:?} after the previous one settled",
            next_started.duration_since(previous_settled)
        );
    }
}
