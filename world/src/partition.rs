//! Classification-indexed membership sets over the dense cell array.

use grid_explorer_core::{Classification, ClassificationCounts};

/// Five membership lists that together partition every cell.
///
/// Each cell index appears in exactly one list. `positions` remembers where
/// inside its list a cell sits so moves are a swap-remove plus a push.
#[derive(Clone, Debug, Default)]
pub(crate) struct Partition {
    members: [Vec<usize>; Classification::COUNT],
    positions: Vec<usize>,
}

impl Partition {
    /// Creates an empty partition able to hold `capacity` cells.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Default::default(),
            positions: Vec::with_capacity(capacity),
        }
    }

    /// Appends the next cell index into the provided classification.
    ///
    /// Cells must be inserted in index order, once each.
    pub(crate) fn push(&mut self, cell: usize, classification: Classification) {
        debug_assert_eq!(cell, self.positions.len());
        let list = &mut self.members[classification.slot()];
        self.positions.push(list.len());
        list.push(cell);
    }

    /// Moves a cell between membership lists.
    pub(crate) fn relocate(&mut self, cell: usize, from: Classification, to: Classification) {
        if from == to {
            return;
        }

        let position = self.positions[cell];
        let source = &mut self.members[from.slot()];
        let removed = source.swap_remove(position);
        debug_assert_eq!(removed, cell);
        if let Some(&displaced) = source.get(position) {
            self.positions[displaced] = position;
        }

        let destination = &mut self.members[to.slot()];
        self.positions[cell] = destination.len();
        destination.push(cell);
    }

    /// Cell indices currently holding the provided classification.
    pub(crate) fn members(&self, classification: Classification) -> &[usize] {
        &self.members[classification.slot()]
    }

    /// Size of every membership list.
    pub(crate) fn counts(&self) -> ClassificationCounts {
        let len = |classification: Classification| self.members(classification).len();
        ClassificationCounts {
            unknown: len(Classification::Unknown),
            known: len(Classification::Known),
            seen: len(Classification::Seen),
            ignored: len(Classification::Ignored),
            disconnected: len(Classification::Disconnected),
        }
    }
}
