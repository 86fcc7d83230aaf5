//! Action enum: everything a key press can ask the app to do.

/// Focusable panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    History,
    Server,
    Players,
}

impl Pane {
    pub fn next(self) -> Self {
        match self {
            Self::History => Self::Server,
            Self::Server => Self::Players,
            Self::Players => Self::History,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::History => Self::Players,
            Self::Server => Self::History,
            Self::Players => Self::Server,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Acquisition ──────────────────────────────────────────────────────────
    EditTarget,
    Fetch(String),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(Pane),
    MoveUp,
    MoveDown,
    NextPage,
    PrevPage,
    Activate,
    ClearSelection,

    // ── Search ───────────────────────────────────────────────────────────────
    OpenSearchName,
    OpenSearchId,
    SearchName(String),
    SearchId(String),

    // ── History ──────────────────────────────────────────────────────────────
    StartRename,
    Rename(String),
    ForgetEntry,
    ClearHistory,

    // ── System ───────────────────────────────────────────────────────────────
    DismissToast,
    ToggleTheme,
    Quit,
}
