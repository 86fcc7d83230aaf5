//! Roster acquisition and enrichment for live game servers.
//!
//! `acquisition` fetches a snapshot through an ordered route list,
//! `enrichment` projects it into the shared `roster` store and streams avatars
//! in from `identity`, `view` pages through the result, and `session` ties
//! those together with `history` and `notify`.

pub mod acquisition;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod history;
pub mod identity;
pub mod model;
pub mod notify;
pub mod platform;
pub mod prefs;
pub mod roster;
pub mod session;
pub mod view;

pub use acquisition::RosterClient;
pub use error::{AcquisitionError, RouteError};
pub use model::{EnrichedPlayer, Player, RosterSnapshot};
pub use roster::{EnrichedRoster, RosterEvent, RosterStore};
pub use session::SessionController;
