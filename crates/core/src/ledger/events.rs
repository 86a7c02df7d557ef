//! Change events published by the ledger.

use serde::{Deserialize, Serialize};

use super::types::{RunCounters, Slot};
use crate::dispatch::SchedulerState;
use crate::ranking::Leaderboard;

/// Discrete ledger change, serialized as `{"type": "...", ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// All run states were rebuilt or cleared.
    RunReset { generation: u64 },
    /// One slot changed, with the competitor's counters after the change.
    SlotUpdated {
        competitor: String,
        row: usize,
        col: usize,
        slot: Slot,
        counters: RunCounters,
    },
    /// Counters changed without a visible slot change.
    CountersUpdated {
        competitor: String,
        counters: RunCounters,
    },
    /// The leaderboard was recomputed.
    RankingChanged { ranking: Leaderboard },
    /// The scheduler moved to a new state.
    SchedulerState { state: SchedulerState },
    /// A competitor was renamed.
    CompetitorRenamed { from: String, to: String },
}

impl LedgerEvent {
    /// The `type` tag this event serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::RunReset { .. } => "run_reset",
            LedgerEvent::SlotUpdated { .. } => "slot_updated",
            LedgerEvent::CountersUpdated { .. } => "counters_updated",
            LedgerEvent::RankingChanged { .. } => "ranking_changed",
            LedgerEvent::SchedulerState { .. } => "scheduler_state",
            LedgerEvent::CompetitorRenamed { .. } => "competitor_renamed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_serialized_tag() {
        let events = [
            LedgerEvent::RunReset { generation: 3 },
            LedgerEvent::CountersUpdated {
                competitor: "Andy".to_string(),
                counters: RunCounters::default(),
            },
            LedgerEvent::SchedulerState {
                state: SchedulerState::CountingDown { remaining: 2 },
            },
            LedgerEvent::CompetitorRenamed {
                from: "Andy".to_string(),
                to: "Ann".to_string(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
        }
    }

    #[test]
    fn test_scheduler_state_nests_its_own_tag() {
        let event = LedgerEvent::SchedulerState {
            state: SchedulerState::CountingDown { remaining: 1 },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["state"]["state"], "counting_down");
        assert_eq!(json["state"]["remaining"], 1);
    }
}
