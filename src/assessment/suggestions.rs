//! Drug-name autocomplete with stale-response protection.
//!
//! Each search is issued under a ticket. Only the response for the most
//! recently issued ticket may replace the suggestion list; anything older,
//! or anything that arrives after the input was cleared, is dropped.

use crate::api::ApiError;

/// Inputs shorter than this clear the list instead of searching.
pub const MIN_QUERY_CHARS: usize = 2;

/// Handle for one in-flight search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    id: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// What happened to a search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Input too short; list cleared without a search.
    Cleared,
    Applied,
    Stale,
    Failed,
}

#[derive(Debug, Default)]
pub struct DrugSuggestions {
    items: Vec<String>,
    latest: u64,
}

impl DrugSuggestions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// React to new input: start a search, or clear the list for short input.
    pub fn begin(&mut self, input: &str) -> Option<SearchTicket> {
        self.latest += 1;
        if input.chars().count() < MIN_QUERY_CHARS {
            self.items.clear();
            return None;
        }
        Some(SearchTicket {
            id: self.latest,
            query: input.to_string(),
        })
    }

    /// Apply a search response if it is still the latest.
    pub fn resolve(
        &mut self,
        ticket: &SearchTicket,
        response: Result<Vec<String>, ApiError>,
    ) -> SearchOutcome {
        if ticket.id != self.latest {
            tracing::debug!(query = %ticket.query, "Discarding stale drug search response");
            return SearchOutcome::Stale;
        }
        match response {
            Ok(items) => {
                self.items = items;
                SearchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(query = %ticket.query, "Drug search failed: {e}");
                SearchOutcome::Failed
            }
        }
    }

    /// Take the suggestion at `index` and clear the list.
    pub fn select(&mut self, index: usize) -> Option<String> {
        let chosen = self.items.get(index).cloned()?;
        self.clear();
        Some(chosen)
    }

    /// Empty the list and invalidate any in-flight search.
    pub fn clear(&mut self) {
        self.latest += 1;
        self.items.clear();
    }
}
