use serde::{Deserialize, Serialize};

/// One connected player as reported by the server descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub ping: u32,
    /// Tagged identifiers such as `discord:1234` or `license:abcd`.
    #[serde(default)]
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub endpoint: String,
}

/// One successful acquisition. Players keep the order the server sent them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// Server session metadata, passed through untouched for display.
    #[serde(default)]
    pub dynamic_info: serde_json::Value,
    pub players: Vec<Player>,
}

impl RosterSnapshot {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// A player plus whatever the identity lookup has attached to it so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPlayer {
    #[serde(flatten)]
    pub player: Player,
    pub external_id: Option<String>,
    pub avatar_ref: Option<String>,
}

impl EnrichedPlayer {
    /// Project a raw player, taking the first identifier whose tag is in
    /// `prefixes`. The avatar always starts out absent.
    pub fn project(player: Player, prefixes: &[String]) -> Self {
        let external_id = extract_external_id(&player.identifiers, prefixes);
        Self {
            player,
            external_id,
            avatar_ref: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.player.id
    }

    pub fn name(&self) -> &str {
        &self.player.name
    }
}

/// First identifier carrying a known tag, with the tag stripped.
pub fn extract_external_id(identifiers: &[String], prefixes: &[String]) -> Option<String> {
    identifiers.iter().find_map(|ident| {
        prefixes
            .iter()
            .find_map(|p| ident.strip_prefix(p.as_str()))
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    })
}
