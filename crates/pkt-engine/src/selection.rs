//! Selection and viewport state
//!
//! Indices are into the newest-first view: row 0 is the newest record.
//! `first_visible <= selected < max(1, len)` holds after every operation.

use serde::{Deserialize, Serialize};

/// Selected row and top-of-viewport offset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    selected: usize,
    first_visible: usize,
}

impl Selection {
    /// Selection on the newest row
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected row (0 = newest)
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// First row shown in the viewport
    pub fn first_visible(&self) -> usize {
        self.first_visible
    }

    /// Whether the newest row is selected (the table follows new traffic)
    pub fn is_following(&self) -> bool {
        self.selected == 0
    }

    /// Keep pointing at the same record after one append
    ///
    /// Only applies when scrolled away from the newest row; the index is
    /// clamped to the new last row, which covers the record having been
    /// evicted.
    pub fn on_append(&mut self, len: usize) {
        if self.selected > 0 {
            self.selected = (self.selected + 1).min(len.saturating_sub(1));
        }
    }

    /// Scroll just enough to keep the selected row among `visible_rows`
    pub fn reconcile(&mut self, visible_rows: usize) {
        let visible_rows = visible_rows.max(1);
        if self.selected == 0 {
            self.first_visible = 0;
        } else if self.selected - self.first_visible.min(self.selected) >= visible_rows {
            self.first_visible = self.selected + 1 - visible_rows;
        } else if self.selected < self.first_visible {
            self.first_visible = self.selected;
        }
    }

    /// Move toward newer rows; ignored at the top
    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.first_visible = self.first_visible.min(self.selected);
        }
    }

    /// Move toward older rows; ignored at the last row
    pub fn down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    /// Jump back to the newest row
    pub fn newest(&mut self) {
        self.reset();
    }

    /// Clamp into range for a store of `len` records
    pub fn clamp(&mut self, len: usize) {
        let last = len.saturating_sub(1);
        self.selected = self.selected.min(last);
        self.first_visible = self.first_visible.min(self.selected);
    }

    /// Back to (0, 0)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
