//! Core types for WaniKani SRS statistics.

use core::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// SRS maturity bucket for reviewed items.
///
/// WaniKani reports per-item stage numbers 1-9; those collapse into the
/// five named buckets shown on the dashboard (stages 1-4 are Apprentice,
/// 5-6 are Guru, 7 Master, 8 Enlightened, 9 Burned). Stage 0 is the
/// lesson queue and is not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SrsStage {
    Apprentice,
    Guru,
    Master,
    Enlightened,
    Burned,
}

impl SrsStage {
    /// All stages in review-maturity order.
    pub const ALL: [SrsStage; 5] = [
        SrsStage::Apprentice,
        SrsStage::Guru,
        SrsStage::Master,
        SrsStage::Enlightened,
        SrsStage::Burned,
    ];

    /// Map a WaniKani per-item stage number to its named bucket.
    ///
    /// # Examples
    ///
    /// ```
    /// use wkstats_types::SrsStage;
    ///
    /// assert_eq!(SrsStage::from_stage_number(1), Some(SrsStage::Apprentice));
    /// assert_eq!(SrsStage::from_stage_number(6), Some(SrsStage::Guru));
    /// assert_eq!(SrsStage::from_stage_number(9), Some(SrsStage::Burned));
    /// assert_eq!(SrsStage::from_stage_number(0), None);
    /// ```
    #[must_use]
    pub fn from_stage_number(n: u8) -> Option<Self> {
        match n {
            1..=4 => Some(SrsStage::Apprentice),
            5..=6 => Some(SrsStage::Guru),
            7 => Some(SrsStage::Master),
            8 => Some(SrsStage::Enlightened),
            9 => Some(SrsStage::Burned),
            _ => None,
        }
    }

    /// Lowercase name matching the serialized form.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SrsStage::Apprentice => "apprentice",
            SrsStage::Guru => "guru",
            SrsStage::Master => "master",
            SrsStage::Enlightened => "enlightened",
            SrsStage::Burned => "burned",
        }
    }

    /// Capitalized label for display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SrsStage::Apprentice => "Apprentice",
            SrsStage::Guru => "Guru",
            SrsStage::Master => "Master",
            SrsStage::Enlightened => "Enlightened",
            SrsStage::Burned => "Burned",
        }
    }
}

impl fmt::Display for SrsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Item counts per SRS stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTotals {
    pub apprentice: u32,
    pub guru: u32,
    pub master: u32,
    pub enlightened: u32,
    pub burned: u32,
}

impl StageTotals {
    /// Get the count for a stage.
    #[must_use]
    pub fn get(&self, stage: SrsStage) -> u32 {
        match stage {
            SrsStage::Apprentice => self.apprentice,
            SrsStage::Guru => self.guru,
            SrsStage::Master => self.master,
            SrsStage::Enlightened => self.enlightened,
            SrsStage::Burned => self.burned,
        }
    }

    fn slot_mut(&mut self, stage: SrsStage) -> &mut u32 {
        match stage {
            SrsStage::Apprentice => &mut self.apprentice,
            SrsStage::Guru => &mut self.guru,
            SrsStage::Master => &mut self.master,
            SrsStage::Enlightened => &mut self.enlightened,
            SrsStage::Burned => &mut self.burned,
        }
    }

    /// Count one item at the given WaniKani stage number.
    ///
    /// Returns `false` for stage numbers outside the counted 1-9 range
    /// (the lesson queue, or values a future API revision might add).
    pub fn record_stage_number(&mut self, n: u8) -> bool {
        match SrsStage::from_stage_number(n) {
            Some(stage) => {
                *self.slot_mut(stage) += 1;
                true
            }
            None => false,
        }
    }

    /// Total items across all stages.
    #[must_use]
    pub fn total(&self) -> u32 {
        SrsStage::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// One day's recorded stage totals and user level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Calendar date (UTC) this snapshot describes. One snapshot per date.
    pub date: Date,
    /// Item counts per SRS stage.
    pub stages: StageTotals,
    /// User level at fetch time.
    pub level: u32,
    /// When the snapshot was actually fetched.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// The persisted time series of snapshots.
///
/// Snapshots are kept sorted ascending by date with at most one entry
/// per date. Dates need not be contiguous; a missed day simply leaves
/// a gap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub snapshots: Vec<Snapshot>,
}

impl History {
    /// Number of snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the history holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The snapshot for a given date, if recorded.
    #[must_use]
    pub fn get(&self, date: Date) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.date == date)
    }

    /// The most recent snapshot by date.
    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Insert a snapshot, replacing any existing entry for the same date.
    ///
    /// Keeps the sequence sorted ascending by date.
    pub fn upsert(&mut self, snapshot: Snapshot) {
        self.snapshots.retain(|s| s.date != snapshot.date);
        self.snapshots.push(snapshot);
        self.snapshots.sort_by_key(|s| s.date);
    }
}
