use std::collections::HashMap;

use crate::models::DetailContent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailState {
    #[default]
    NotFetched,
    Pending,
    Fetched(DetailContent),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemState {
    pub expanded: bool,
    pub detail: DetailState,
}

impl ItemState {
    pub fn has_fetched_detail(&self) -> bool {
        matches!(self.detail, DetailState::Fetched(_))
    }

    pub fn content(&self) -> Option<&DetailContent> {
        match &self.detail {
            DetailState::Fetched(content) => Some(content),
            _ => None,
        }
    }

    /// Expanded but nothing to show yet: still fetching, or the stored
    /// content has neither fragment.
    pub fn shows_placeholder(&self) -> bool {
        self.expanded && self.content().map(DetailContent::is_empty).unwrap_or(true)
    }
}

/// Emitted when an expansion needs the detail page fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRequest {
    pub id: i64,
}

#[derive(Debug, Default)]
pub struct ExpansionState {
    items: HashMap<i64, ItemState>,
}

impl ExpansionState {
    pub fn item(&self, id: i64) -> ItemState {
        self.items.get(&id).cloned().unwrap_or_default()
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.items.get(&id).map(|item| item.expanded).unwrap_or(false)
    }

    /// Collapsed -> Expanded. Requests a fetch only the first time, so
    /// repeated expansion, or re-expansion while pending, is free.
    pub fn expand(&mut self, id: i64) -> Option<DetailRequest> {
        let item = self.items.entry(id).or_default();
        item.expanded = true;
        if item.detail == DetailState::NotFetched {
            item.detail = DetailState::Pending;
            Some(DetailRequest { id })
        } else {
            None
        }
    }

    /// Expanded -> Collapsed. Stored content is kept.
    pub fn collapse(&mut self, id: i64) {
        self.items.entry(id).or_default().expanded = false;
    }

    pub fn toggle(&mut self, id: i64) -> Option<DetailRequest> {
        if self.is_expanded(id) {
            self.collapse(id);
            None
        } else {
            self.expand(id)
        }
    }

    /// Stores a resolution, empty or not. Written once per item lifetime.
    pub fn complete(&mut self, id: i64, content: DetailContent) {
        let item = self.items.entry(id).or_default();
        if !item.has_fetched_detail() {
            item.detail = DetailState::Fetched(content);
        }
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
