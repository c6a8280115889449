use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::{Walkthrough, WalkthroughId};

/// A walkthrough with its display ordinal (`count - index`, so the oldest is 1)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkthroughEntry {
    pub id: WalkthroughId,
    pub timestamp: DateTime<Utc>,
    pub ordinal: usize,
}

/// Locally known walkthroughs (most recent first) and the current selection
#[derive(Debug, Clone, Default)]
pub struct WalkthroughCatalog {
    walkthroughs: Vec<Walkthrough>,
    selected: Option<WalkthroughId>,
}

impl WalkthroughCatalog {
    pub fn len(&self) -> usize {
        self.walkthroughs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walkthroughs.is_empty()
    }

    pub fn newest(&self) -> Option<&Walkthrough> {
        self.walkthroughs.first()
    }

    pub fn selected(&self) -> Option<WalkthroughId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<WalkthroughId>) {
        self.selected = id;
    }

    /// Replace the list, keeping it ordered by timestamp descending
    pub fn replace(&mut self, mut walkthroughs: Vec<Walkthrough>) {
        walkthroughs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.walkthroughs = walkthroughs;
    }

    /// Select the newest walkthrough if nothing is selected yet
    pub fn select_newest_if_unset(&mut self) {
        if self.selected.is_none() {
            self.selected = self.newest().map(|w| w.id);
        }
    }

    pub fn entries(&self) -> Vec<WalkthroughEntry> {
        let count = self.walkthroughs.len();
        self.walkthroughs
            .iter()
            .enumerate()
            .map(|(index, w)| WalkthroughEntry {
                id: w.id,
                timestamp: w.timestamp,
                ordinal: count - index,
            })
            .collect()
    }
}
