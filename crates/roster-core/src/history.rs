//! Recently queried targets, most recent first.
//!
//! Stored as a JSON array next to the other app data. Older builds wrote a
//! plain array of `"host:port"` strings; those load fine and are upgraded to
//! full entries stamped with the load time. A file that cannot be read or
//! parsed is treated as an empty history.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const MAX_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `host:port`, unique within the history.
    pub address: String,
    #[serde(default)]
    pub custom_name: Option<String>,
    /// Logo URL or `data:` URI.
    #[serde(default)]
    pub logo_ref: Option<String>,
    pub last_used_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(address: String, now: DateTime<Utc>) -> Self {
        Self {
            address,
            custom_name: None,
            logo_ref: None,
            last_used_at: now,
        }
    }

    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.address)
    }

    /// Split the address back into host and port. The port is taken after
    /// the last `:` so bracket-less IPv6 hosts still round-trip.
    pub fn host_port(&self) -> Option<(&str, u16)> {
        let (host, port) = self.address.rsplit_once(':')?;
        Some((host, port.parse().ok()?))
    }
}

/// One element of the on-disk array, either format.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Legacy(String),
    Entry(HistoryEntry),
}

pub fn make_address(host: &str, port: u16) -> String {
    format!("{}:{}", host.trim(), port)
}

pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    path: Option<PathBuf>,
}

impl HistoryStore {
    /// History that is never written anywhere.
    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            path: None,
        }
    }

    /// Load from `path`, swallowing any read or parse failure.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => parse_stored(&content, Utc::now()).unwrap_or_else(|e| {
                warn!("[history] ignoring unreadable {}: {}", path.display(), e);
                Vec::new()
            }),
            Err(e) => {
                debug!("[history] no history at {}: {}", path.display(), e);
                Vec::new()
            }
        };
        Self {
            entries,
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, address: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.address == address)
    }

    pub fn record(&mut self, address: &str) {
        self.record_at(address, Utc::now());
    }

    /// Insert or refresh `address` and move it to the front. An existing
    /// entry keeps its name and logo.
    pub fn record_at(&mut self, address: &str, now: DateTime<Utc>) {
        let address = address.trim();
        if address.is_empty() {
            return;
        }
        let mut entry = match self.entries.iter().position(|e| e.address == address) {
            Some(pos) => self.entries.remove(pos),
            None => HistoryEntry::new(address.to_string(), now),
        };
        entry.last_used_at = now;
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.persist();
    }

    pub fn remove(&mut self, address: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.address != address);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Set the display name and logo of an existing entry. Blank strings
    /// clear the field. Unknown addresses are left alone; returns whether an
    /// entry was updated.
    pub fn set_metadata(
        &mut self,
        address: &str,
        custom_name: Option<String>,
        logo_ref: Option<String>,
    ) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.address == address) else {
            return false;
        };
        entry.custom_name = non_blank(custom_name);
        entry.logo_ref = non_blank(logo_ref);
        self.persist();
        true
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_entries(path, &self.entries) {
            warn!("[history] failed to save {}: {}", path.display(), e);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn write_entries(path: &Path, entries: &[HistoryEntry]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Parse either storage format, dedupe by address (first wins) and cap.
fn parse_stored(content: &str, now: DateTime<Utc>) -> anyhow::Result<Vec<HistoryEntry>> {
    let stored: Vec<StoredEntry> = serde_json::from_str(content)?;
    let mut entries: Vec<HistoryEntry> = Vec::with_capacity(stored.len());
    for item in stored {
        let entry = match item {
            StoredEntry::Legacy(address) => HistoryEntry::new(address.trim().to_string(), now),
            StoredEntry::Entry(entry) => entry,
        };
        if entry.address.is_empty() || entries.iter().any(|e| e.address == entry.address) {
            continue;
        }
        entries.push(entry);
    }
    entries.truncate(MAX_ENTRIES);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn addresses(store: &HistoryStore) -> Vec<&str> {
        store.list().iter().map(|e| e.address.as_str()).collect()
    }

    #[test]
    fn test_record_moves_to_front_and_caps() {
        let mut store = HistoryStore::in_memory();
        for (i, addr) in ["a:1", "b:1", "c:1", "d:1", "e:1", "f:1"].iter().enumerate() {
            store.record_at(addr, at(i as i64));
        }
        assert_eq!(addresses(&store), vec!["f:1", "e:1", "d:1", "c:1", "b:1"]);

        store.record_at("c:1", at(100));
        assert_eq!(addresses(&store), vec!["c:1", "f:1", "e:1", "d:1", "b:1"]);
        assert_eq!(store.get("c:1").unwrap().last_used_at, at(100));
    }

    #[test]
    fn test_repeated_address_never_exceeds_cap() {
        let mut store = HistoryStore::in_memory();
        for i in 0..6 {
            store.record_at("same:30120", at(i * 2));
            store.record_at(&format!("other{}:30120", i), at(i * 2 + 1));
            assert!(store.list().len() <= MAX_ENTRIES);
        }
        store.record_at("same:30120", at(99));
        assert_eq!(store.list()[0].address, "same:30120");
        assert_eq!(
            store.list().iter().filter(|e| e.address == "same:30120").count(),
            1
        );
    }

    #[test]
    fn test_record_keeps_metadata() {
        let mut store = HistoryStore::in_memory();
        store.record_at("a:1", at(1));
        assert!(store.set_metadata("a:1", Some("My City".into()), Some("https://x/logo.png".into())));
        store.record_at("b:1", at(2));
        store.record_at("a:1", at(3));

        let entry = &store.list()[0];
        assert_eq!(entry.address, "a:1");
        assert_eq!(entry.display_name(), "My City");
        assert_eq!(entry.logo_ref.as_deref(), Some("https://x/logo.png"));
    }

    #[test]
    fn test_set_metadata_unknown_is_noop() {
        let mut store = HistoryStore::in_memory();
        store.record_at("a:1", at(1));
        assert!(!store.set_metadata("zzz:1", Some("ghost".into()), None));
        assert_eq!(addresses(&store), vec!["a:1"]);
    }

    #[test]
    fn test_set_metadata_blank_clears() {
        let mut store = HistoryStore::in_memory();
        store.record_at("a:1", at(1));
        store.set_metadata("a:1", Some("Name".into()), None);
        store.set_metadata("a:1", Some("   ".into()), None);
        assert!(store.get("a:1").unwrap().custom_name.is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = HistoryStore::in_memory();
        store.record_at("a:1", at(1));
        store.record_at("b:1", at(2));
        assert!(store.remove("a:1"));
        assert!(!store.remove("a:1"));
        assert_eq!(addresses(&store), vec!["b:1"]);
        store.clear();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_legacy_strings_upconverted() {
        let entries = parse_stored(r#"["1.2.3.4:30120", "play.example.com:30120"]"#, at(50)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].address, "1.2.3.4:30120");
        assert_eq!(entries[0].last_used_at, at(50));
        assert!(entries[0].custom_name.is_none());
    }

    #[test]
    fn test_mixed_formats_deduped() {
        let content = r#"[
            {"address": "a:1", "custom_name": "A", "last_used_at": "2024-01-01T00:00:00Z"},
            "a:1",
            "b:1"
        ]"#;
        let entries = parse_stored(content, at(0)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name(), "A");
    }

    #[test]
    fn test_host_port() {
        let entry = HistoryEntry::new("play.example.com:30120".into(), at(0));
        assert_eq!(entry.host_port(), Some(("play.example.com", 30120)));
        let bad = HistoryEntry::new("noport".into(), at(0));
        assert_eq!(bad.host_port(), None);
        assert_eq!(make_address(" 1.2.3.4 ", 30120), "1.2.3.4:30120");
    }

    #[test]
    fn test_persist_round_trip_and_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut store = HistoryStore::load(&path);
        assert!(store.list().is_empty());
        store.record("a:1");
        store.set_metadata("a:1", Some("Alpha".into()), None);

        let reloaded = HistoryStore::load(&path);
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.list()[0].display_name(), "Alpha");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(HistoryStore::load(&path).list().is_empty());
    }
}
