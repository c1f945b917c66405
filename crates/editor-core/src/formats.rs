use std::collections::BTreeMap;

use serde::Serialize;

use crate::command::{CommandTable, FormatId};
use crate::surface::EditableSurface;

/// Which formats are in effect at the current selection, for toolbar highlighting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActiveFormats(BTreeMap<FormatId, bool>);

impl ActiveFormats {
    pub fn is_active(&self, id: FormatId) -> bool {
        self.0.get(&id).copied().unwrap_or(false)
    }

    pub fn get(&self, id: FormatId) -> Option<bool> {
        self.0.get(&id).copied()
    }

    pub fn active(&self) -> impl Iterator<Item = FormatId> + '_ {
        self.0
            .iter()
            .filter_map(|(id, active)| active.then_some(*id))
    }

    pub fn none_active(&self) -> bool {
        self.0.values().all(|active| !active)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormatId, bool)> + '_ {
        self.0.iter().map(|(id, active)| (*id, *active))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read-side projection of the command table predicates.
///
/// Triggers only mark the snapshot stale; the surface is queried once when
/// the snapshot is next read.
#[derive(Debug, Clone)]
pub struct ActiveFormatTracker {
    snapshot: ActiveFormats,
    stale: bool,
}

impl Default for ActiveFormatTracker {
    fn default() -> Self {
        Self {
            snapshot: ActiveFormats::default(),
            stale: true,
        }
    }
}

impl ActiveFormatTracker {
    pub fn request_refresh(&mut self) {
        self.stale = true;
    }

    pub fn snapshot(&mut self, table: &CommandTable, surface: &dyn EditableSurface) -> &ActiveFormats {
        if self.stale {
            self.snapshot = query_all(table, surface);
            self.stale = false;
        }
        &self.snapshot
    }
}

fn query_all(table: &CommandTable, surface: &dyn EditableSurface) -> ActiveFormats {
    ActiveFormats(
        table
            .iter()
            .map(|spec| (spec.id, spec.is_active(surface)))
            .collect(),
    )
}
