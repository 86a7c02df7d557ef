//! Ledger types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slots per ledger row.
pub const ROW_WIDTH: usize = 50;

/// Upper bound on ring capacity; every slot is allocated up front.
pub const MAX_ITEMS_PER_COMPETITOR: usize = 100_000;

/// Status of a single ring slot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Empty,
    Running,
    Pass,
    Fail,
}

/// One position of a competitor's result ring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub status: SlotStatus,
    /// Item id, pre-labelled at initialization and overwritten on dispatch.
    pub id: Option<String>,
    pub request_time: Option<DateTime<Utc>>,
    pub response_time: Option<DateTime<Utc>>,
    /// Bumped each time the slot is occupied by a new request.
    #[serde(skip)]
    pub(crate) version: u64,
}

impl Slot {
    pub(crate) fn labelled(id: Option<String>) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Clear status and timestamps, keeping the id.
    pub(crate) fn clear(&mut self) {
        self.status = SlotStatus::Empty;
        self.request_time = None;
        self.response_time = None;
    }

    /// Response latency when both timestamps are present.
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.request_time, self.response_time) {
            (Some(req), Some(resp)) => Some((resp - req).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }
}

/// Row/column address of a slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotPosition {
    pub row: usize,
    pub col: usize,
}

impl SlotPosition {
    /// Address of the ring slot that the `total`-th request (0-based) lands in.
    pub fn for_total(total: u64, capacity: usize) -> Self {
        let index = (total % capacity as u64) as usize;
        Self {
            row: index / ROW_WIDTH,
            col: index % ROW_WIDTH,
        }
    }
}

/// Aggregate counters for one competitor's run.
///
/// `passed + failed + running == total` holds after every ledger operation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunCounters {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub running: u64,
}

impl RunCounters {
    pub fn is_consistent(&self) -> bool {
        self.passed + self.failed + self.running == self.total
    }
}

/// Counters and result grid for one competitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitorRunState {
    pub name: String,
    #[serde(flatten)]
    pub counters: RunCounters,
    pub rows: Vec<Vec<Slot>>,
    /// Resolved ids of the prepared items, in dispatch order.
    #[serde(skip)]
    pub(crate) item_ids: Vec<String>,
}

impl CompetitorRunState {
    /// Build the ring for `capacity` slots, labelling slot `i` with `item_ids[i]`.
    pub(crate) fn new(name: String, item_ids: Vec<String>, capacity: usize) -> Self {
        let mut rows = Vec::with_capacity(capacity.div_ceil(ROW_WIDTH));
        let mut start = 0;
        while start < capacity {
            let width = ROW_WIDTH.min(capacity - start);
            let row = (start..start + width)
                .map(|i| Slot::labelled(item_ids.get(i).cloned()))
                .collect();
            rows.push(row);
            start += width;
        }
        Self {
            name,
            counters: RunCounters::default(),
            rows,
            item_ids,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn slot(&self, position: SlotPosition) -> Option<&Slot> {
        self.rows.get(position.row)?.get(position.col)
    }

    pub(crate) fn slot_mut(&mut self, position: SlotPosition) -> Option<&mut Slot> {
        self.rows.get_mut(position.row)?.get_mut(position.col)
    }

    /// Resolved item ids available for dispatch.
    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    /// All slots in ring order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.rows.iter().flatten()
    }

    pub(crate) fn reset(&mut self) {
        self.counters = RunCounters::default();
        for slot in self.rows.iter_mut().flatten() {
            slot.clear();
        }
    }
}

/// Settled result of a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
        }
    }
}

/// Handle returned by `begin_request`, presented again on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTicket {
    pub competitor: String,
    pub position: SlotPosition,
    pub item_id: String,
    pub(crate) generation: u64,
    pub(crate) version: u64,
}

/// What a completion did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    /// Counters and slot updated.
    Applied,
    /// The slot was re-occupied since dispatch, only counters were settled.
    CountersOnly,
    /// The run was reset since dispatch, nothing changed.
    Discarded,
}

/// Ledger errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger has not been initialized")]
    NotInitialized,

    #[error("Unknown competitor: {0}")]
    UnknownCompetitor(String),

    #[error("Competitor {0} has no result slots")]
    NoCapacity(String),
}
