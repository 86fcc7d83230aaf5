//! Roster view: search, order and paginate the enriched roster.
//!
//! `project` is a pure function of `(roster, view state)`. Rows are always in
//! ascending id order, so avatars streaming in never reshuffle the table.

use crate::model::EnrichedPlayer;
use crate::roster::EnrichedRoster;

pub const PAGE_SIZE: usize = 20;

/// Operator-controlled query. Changing either search term resets to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    search_name: String,
    search_id: String,
    page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_name: String::new(),
            search_id: String::new(),
            page: 1,
        }
    }
}

impl ViewState {
    pub fn search_name(&self) -> &str {
        &self.search_name
    }

    pub fn search_id(&self) -> &str {
        &self.search_id
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_search_name(&mut self, query: impl Into<String>) {
        self.search_name = query.into();
        self.page = 1;
    }

    pub fn set_search_id(&mut self, query: impl Into<String>) {
        self.search_id = query.into();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page += 1;
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Pull `page` back into range for a filtered view of `matched` rows.
    pub fn clamp(&mut self, matched: usize) {
        self.page = clamp_page(self.page, matched);
    }

    pub fn matches(&self, player: &EnrichedPlayer) -> bool {
        let name_ok = self.search_name.is_empty()
            || player
                .name()
                .to_lowercase()
                .contains(&self.search_name.to_lowercase());
        let id_ok =
            self.search_id.is_empty() || player.id().to_string().contains(&self.search_id);
        name_ok && id_ok
    }
}

/// One page of the filtered roster.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    /// Page actually shown, after clamping.
    pub page: usize,
    pub page_count: usize,
    /// Players matching the search, across all pages.
    pub matched: usize,
    /// Players in the roster.
    pub total: usize,
    pub rows: Vec<EnrichedPlayer>,
}

impl PageView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn page_count(matched: usize) -> usize {
    matched.div_ceil(PAGE_SIZE)
}

fn clamp_page(page: usize, matched: usize) -> usize {
    page.clamp(1, page_count(matched).max(1))
}

/// Filtered roster in ascending id order.
pub fn filtered<'a>(roster: &'a EnrichedRoster, view: &ViewState) -> Vec<&'a EnrichedPlayer> {
    // BTreeMap iteration is already ascending by id.
    roster.players.values().filter(|p| view.matches(p)).collect()
}

pub fn project(roster: &EnrichedRoster, view: &ViewState) -> PageView {
    let matches = filtered(roster, view);
    let matched = matches.len();
    let page = clamp_page(view.page, matched);
    let start = ((page - 1) * PAGE_SIZE).min(matched);
    let end = (start + PAGE_SIZE).min(matched);

    PageView {
        page,
        page_count: page_count(matched),
        matched,
        total: roster.len(),
        rows: matches[start..end].iter().map(|p| (*p).clone()).collect(),
    }
}
