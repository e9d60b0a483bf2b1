//! Day-over-day delta computation.

use serde::Serialize;
use time::Date;

use crate::types::{History, Snapshot, SrsStage, StageTotals};

/// Signed change per stage and level between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDelta {
    pub apprentice: i64,
    pub guru: i64,
    pub master: i64,
    pub enlightened: i64,
    pub burned: i64,
    pub level: i64,
}

impl StageDelta {
    /// Get the change for a stage.
    #[must_use]
    pub fn get(&self, stage: SrsStage) -> i64 {
        match stage {
            SrsStage::Apprentice => self.apprentice,
            SrsStage::Guru => self.guru,
            SrsStage::Master => self.master,
            SrsStage::Enlightened => self.enlightened,
            SrsStage::Burned => self.burned,
        }
    }

    /// Compute `next - prev` per field.
    #[must_use]
    pub fn between(prev: &Snapshot, next: &Snapshot) -> Self {
        let diff = |stage| i64::from(next.stages.get(stage)) - i64::from(prev.stages.get(stage));
        Self {
            apprentice: diff(SrsStage::Apprentice),
            guru: diff(SrsStage::Guru),
            master: diff(SrsStage::Master),
            enlightened: diff(SrsStage::Enlightened),
            burned: diff(SrsStage::Burned),
            level: i64::from(next.level) - i64::from(prev.level),
        }
    }
}

/// One rendered row: a snapshot plus its delta versus the preceding
/// snapshot by date order. `delta` is `None` for the earliest snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaRow {
    pub date: Date,
    pub stages: StageTotals,
    pub level: u32,
    pub delta: Option<StageDelta>,
}

/// Derived day-over-day view of a [`History`]. Not persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeltaView {
    pub rows: Vec<DeltaRow>,
}

impl DeltaView {
    /// Build the view by walking snapshots in ascending date order.
    ///
    /// The first row never carries a delta. Gaps between dates are fine;
    /// each delta is simply against the immediately preceding snapshot,
    /// however many days back that is.
    #[must_use]
    pub fn from_history(history: &History) -> Self {
        let rows = history
            .snapshots
            .iter()
            .enumerate()
            .map(|(i, snapshot)| DeltaRow {
                date: snapshot.date,
                stages: snapshot.stages,
                level: snapshot.level,
                delta: (i > 0).then(|| StageDelta::between(&history.snapshots[i - 1], snapshot)),
            })
            .collect();
        Self { rows }
    }

    /// Whether the view holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
