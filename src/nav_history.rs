use std::collections::VecDeque;

use crate::view_state::ViewLocation;

pub const DEFAULT_CAPACITY: usize = 50;

/// Back/forward navigation history of explicit jumps (links, outline,
/// page input). Consecutive entries on the same page collapse into one.
#[derive(Debug)]
pub struct NavHistory {
    entries: VecDeque<ViewLocation>,
    /// Position while walking back; `None` means at the newest entry
    current_position: Option<usize>,
    max_size: usize,
    enabled: bool,
}

impl NavHistory {
    pub fn new(max_size: usize, enabled: bool) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size.min(DEFAULT_CAPACITY)),
            current_position: None,
            max_size: max_size.max(1),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(DEFAULT_CAPACITY, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn push(&mut self, location: ViewLocation) {
        if !self.enabled {
            return;
        }
        if let Some(pos) = self.current_position {
            self.entries.truncate(pos + 1);
        }
        self.current_position = None;

        if let Some(last) = self.entries.back_mut() {
            if last.page == location.page {
                *last = location;
                return;
            }
        }
        self.entries.push_back(location);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
    }

    /// Step back. When at the newest entry, `current` is recorded first so
    /// that going forward returns to it.
    pub fn back(&mut self, current: Option<ViewLocation>) -> Option<ViewLocation> {
        if !self.enabled {
            return None;
        }
        if self.current_position.is_none() {
            if let Some(loc) = current {
                if self.entries.back().map(|last| last.page) != Some(loc.page) {
                    self.entries.push_back(loc);
                    while self.entries.len() > self.max_size {
                        self.entries.pop_front();
                    }
                }
            }
        }

        match self.current_position {
            None if self.entries.len() >= 2 => {
                let pos = self.entries.len() - 2;
                self.current_position = Some(pos);
                self.entries.get(pos).copied()
            }
            Some(pos) if pos > 0 => {
                self.current_position = Some(pos - 1);
                self.entries.get(pos - 1).copied()
            }
            _ => None,
        }
    }

    pub fn forward(&mut self) -> Option<ViewLocation> {
        let pos = self.current_position?;
        if pos + 1 < self.entries.len() {
            self.current_position = Some(pos + 1);
            if pos + 2 == self.entries.len() {
                self.current_position = None;
            }
            self.entries.get(pos + 1).copied()
        } else {
            self.current_position = None;
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_position = None;
    }
}
