use std::collections::VecDeque;

use log::debug;

use crate::error::{EditError, Result};

pub const MAX_UNDO_DEPTH: usize = 20;

/// Bounded stack of full buffer snapshots. Pushing past capacity evicts the
/// oldest snapshot.
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    snapshots: VecDeque<Vec<u8>>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Vec<u8>) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > MAX_UNDO_DEPTH {
            self.snapshots.pop_front();
            debug!("undo history full, dropped oldest snapshot");
        }
    }

    pub fn pop(&mut self) -> Result<Vec<u8>> {
        self.snapshots.pop_back().ok_or(EditError::Empty)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
