//! The result ledger.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::events::LedgerEvent;
use super::types::{
    CompetitorRunState, CompletionEffect, LedgerError, Outcome, SlotPosition, SlotStatus,
    SlotTicket,
};
use crate::metrics::STALE_COMPLETIONS;
use crate::preparation::Item;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Point-in-time copy of the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub generation: u64,
    pub capacity: usize,
    pub initialized: bool,
    pub competitors: Vec<CompetitorRunState>,
}

/// Per-competitor result rings and counters.
///
/// Every mutation goes through `&mut self`, so callers serialize access with
/// a single lock. Completions are validated against the generation and slot
/// version captured in their `SlotTicket`.
#[derive(Debug)]
pub struct ResultLedger {
    states: Vec<CompetitorRunState>,
    capacity: usize,
    generation: u64,
    initialized: bool,
    events: broadcast::Sender<LedgerEvent>,
}

impl ResultLedger {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            states: Vec::new(),
            capacity,
            generation: 0,
            initialized: false,
            events,
        }
    }

    /// Build one run state per prepared competitor.
    ///
    /// `order` fixes the order of the states; names in `order` without an
    /// entry in `items` are skipped. Missing item ids are resolved to
    /// `item-<index>`.
    pub fn initialize(&mut self, items: &HashMap<String, Vec<Item>>, order: &[String]) {
        self.states = order
            .iter()
            .filter_map(|name| {
                items.get(name).map(|list| {
                    let ids = list
                        .iter()
                        .enumerate()
                        .map(|(i, item)| item.resolve_id(i))
                        .collect();
                    CompetitorRunState::new(name.clone(), ids, self.capacity)
                })
            })
            .collect();
        self.initialized = true;
        self.generation += 1;

        info!(
            competitors = self.states.len(),
            capacity = self.capacity,
            generation = self.generation,
            "Ledger initialized"
        );
        self.emit(LedgerEvent::RunReset {
            generation: self.generation,
        });
    }

    /// Restart: zero counters and clear slot statuses and timestamps.
    ///
    /// Slot ids, ring geometry and competitors are preserved.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
        self.generation += 1;
        debug!(generation = self.generation, "Ledger reset");
        self.emit(LedgerEvent::RunReset {
            generation: self.generation,
        });
    }

    /// Drop every run state, returning to the uninitialized state.
    pub fn clear(&mut self) {
        self.states.clear();
        self.initialized = false;
        self.generation += 1;
        self.emit(LedgerEvent::RunReset {
            generation: self.generation,
        });
    }

    /// Change ring capacity, rebuilding existing states with their item ids.
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity == self.capacity {
            return;
        }
        self.capacity = capacity;
        if !self.initialized {
            return;
        }
        self.states = std::mem::take(&mut self.states)
            .into_iter()
            .map(|state| CompetitorRunState::new(state.name, state.item_ids, capacity))
            .collect();
        self.generation += 1;
        self.emit(LedgerEvent::RunReset {
            generation: self.generation,
        });
    }

    /// Record a dispatch: mark the next ring slot running and bump counters.
    pub fn begin_request(
        &mut self,
        competitor: &str,
        item_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SlotTicket, LedgerError> {
        if !self.initialized {
            return Err(LedgerError::NotInitialized);
        }
        let generation = self.generation;
        let state = self
            .states
            .iter_mut()
            .find(|s| s.name == competitor)
            .ok_or_else(|| LedgerError::UnknownCompetitor(competitor.to_string()))?;

        let capacity = state.capacity();
        if capacity == 0 {
            return Err(LedgerError::NoCapacity(competitor.to_string()));
        }

        let position = SlotPosition::for_total(state.counters.total, capacity);
        let slot = state
            .slot_mut(position)
            .ok_or_else(|| LedgerError::NoCapacity(competitor.to_string()))?;
        slot.status = SlotStatus::Running;
        slot.id = Some(item_id.to_string());
        slot.request_time = Some(now);
        slot.response_time = None;
        slot.version += 1;
        let version = slot.version;
        let slot = slot.clone();

        state.counters.total += 1;
        state.counters.running += 1;
        let counters = state.counters;

        self.emit(LedgerEvent::SlotUpdated {
            competitor: competitor.to_string(),
            row: position.row,
            col: position.col,
            slot,
            counters,
        });

        Ok(SlotTicket {
            competitor: competitor.to_string(),
            position,
            item_id: item_id.to_string(),
            generation,
            version,
        })
    }

    /// Settle a dispatched request.
    pub fn complete_request(
        &mut self,
        ticket: &SlotTicket,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> CompletionEffect {
        if ticket.generation != self.generation {
            STALE_COMPLETIONS.with_label_values(&["discarded"]).inc();
            debug!(
                competitor = %ticket.competitor,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "Discarding completion from a previous run"
            );
            return CompletionEffect::Discarded;
        }

        let Some(state) = self
            .states
            .iter_mut()
            .find(|s| s.name == ticket.competitor)
        else {
            STALE_COMPLETIONS.with_label_values(&["discarded"]).inc();
            warn!(competitor = %ticket.competitor, "Completion for unknown competitor");
            return CompletionEffect::Discarded;
        };

        state.counters.running = state.counters.running.saturating_sub(1);
        match outcome {
            Outcome::Pass => state.counters.passed += 1,
            Outcome::Fail => state.counters.failed += 1,
        }
        let counters = state.counters;

        let slot = match state.slot_mut(ticket.position) {
            Some(slot) if slot.version == ticket.version => {
                slot.status = match outcome {
                    Outcome::Pass => SlotStatus::Pass,
                    Outcome::Fail => SlotStatus::Fail,
                };
                slot.response_time = Some(now);
                Some(slot.clone())
            }
            _ => None,
        };

        match slot {
            Some(slot) => {
                self.emit(LedgerEvent::SlotUpdated {
                    competitor: ticket.competitor.clone(),
                    row: ticket.position.row,
                    col: ticket.position.col,
                    slot,
                    counters,
                });
                CompletionEffect::Applied
            }
            None => {
                STALE_COMPLETIONS.with_label_values(&["slot_reused"]).inc();
                debug!(
                    competitor = %ticket.competitor,
                    row = ticket.position.row,
                    col = ticket.position.col,
                    "Slot re-occupied before completion, settling counters only"
                );
                self.emit(LedgerEvent::CountersUpdated {
                    competitor: ticket.competitor.clone(),
                    counters,
                });
                CompletionEffect::CountersOnly
            }
        }
    }

    /// Rename a competitor's run state. Returns false when `old` has none.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let Some(state) = self.states.iter_mut().find(|s| s.name == old) else {
            return false;
        };
        state.name = new.to_string();
        self.emit(LedgerEvent::CompetitorRenamed {
            from: old.to_string(),
            to: new.to_string(),
        });
        true
    }

    pub fn states(&self) -> &[CompetitorRunState] {
        &self.states
    }

    pub fn state(&self, competitor: &str) -> Option<&CompetitorRunState> {
        self.states.iter().find(|s| s.name == competitor)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            generation: self.generation,
            capacity: self.capacity,
            initialized: self.initialized,
            competitors: self.states.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether any competitor has items to dispatch.
    pub fn has_items(&self) -> bool {
        self.states.iter().any(|s| !s.item_ids.is_empty())
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Publish an event to subscribers. Dropped when nobody listens.
    pub fn emit(&self, event: LedgerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use chrono::TimeDelta;

    fn ledger(capacity: usize, items: usize) -> ResultLedger {
        let mut ledger = ResultLedger::new(capacity);
        let items = fixtures::item_lists(&["Andy", "Bob"], items);
        ledger.initialize(&items, &["Andy".to_string(), "Bob".to_string()]);
        ledger
    }

    fn t0() -> DateTime<Utc> {
        fixtures::epoch()
    }

    #[test]
    fn test_initialize_orders_and_labels() {
        let ledger = ledger(60, 3);
        let names: Vec<_> = ledger.states().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Andy", "Bob"]);
        let andy = ledger.state("Andy").unwrap();
        assert_eq!(andy.rows.len(), 2);
        assert_eq!(andy.rows[1].len(), 10);
        assert_eq!(andy.rows[0][2].id.as_deref(), Some("item-2"));
        assert_eq!(andy.rows[0][3].id, None);
        assert!(ledger.is_initialized());
        assert!(ledger.has_items());
    }

    #[test]
    fn test_initialize_resolves_synthetic_ids() {
        let mut items = HashMap::new();
        items.insert(
            "Andy".to_string(),
            vec![
                Item::new(serde_json::json!({"id": 7})),
                Item::new(serde_json::json!({"name": "no id"})),
            ],
        );
        let mut ledger = ResultLedger::new(10);
        ledger.initialize(&items, &["Andy".to_string(), "Bob".to_string()]);

        assert_eq!(ledger.states().len(), 1);
        assert_eq!(ledger.state("Andy").unwrap().item_ids(), ["7", "item-1"]);
    }

    #[test]
    fn test_begin_and_complete_keep_counters_consistent() {
        let mut ledger = ledger(100, 5);

        let first = ledger.begin_request("Andy", "item-0", t0()).unwrap();
        let second = ledger.begin_request("Andy", "item-1", t0()).unwrap();
        let andy = ledger.state("Andy").unwrap();
        assert_eq!(andy.counters.total, 2);
        assert_eq!(andy.counters.running, 2);
        assert!(andy.counters.is_consistent());
        assert_eq!(andy.rows[0][1].status, SlotStatus::Running);

        let later = t0() + TimeDelta::milliseconds(250);
        assert_eq!(
            ledger.complete_request(&first, Outcome::Pass, later),
            CompletionEffect::Applied
        );
        assert_eq!(
            ledger.complete_request(&second, Outcome::Fail, later),
            CompletionEffect::Applied
        );

        let andy = ledger.state("Andy").unwrap();
        assert_eq!(andy.counters.passed, 1);
        assert_eq!(andy.counters.failed, 1);
        assert_eq!(andy.counters.running, 0);
        assert!(andy.counters.is_consistent());
        assert_eq!(andy.rows[0][0].status, SlotStatus::Pass);
        assert_eq!(andy.rows[0][1].status, SlotStatus::Fail);
        assert_eq!(andy.rows[0][0].duration_seconds(), Some(0.25));
    }

    #[test]
    fn test_ring_wraps_to_oldest_slot() {
        let mut ledger = ledger(3, 3);
        for k in 1..=4u64 {
            let ticket = ledger
                .begin_request("Andy", &format!("item-{}", (k - 1) % 3), t0())
                .unwrap();
            assert_eq!(ticket.position.col, ((k - 1) % 3) as usize);
            ledger.complete_request(&ticket, Outcome::Pass, t0());
        }
        let andy = ledger.state("Andy").unwrap();
        assert_eq!(andy.counters.total, 4);
        assert_eq!(andy.counters.passed, 4);
        assert_eq!(andy.rows[0][0].id.as_deref(), Some("item-0"));
    }

    #[test]
    fn test_completion_after_reset_is_discarded() {
        let mut ledger = ledger(10, 2);
        let ticket = ledger.begin_request("Andy", "item-0", t0()).unwrap();

        ledger.reset();

        assert_eq!(
            ledger.complete_request(&ticket, Outcome::Pass, t0()),
            CompletionEffect::Discarded
        );
        let andy = ledger.state("Andy").unwrap();
        assert_eq!(andy.counters, Default::default());
        assert_eq!(andy.rows[0][0].status, SlotStatus::Empty);
        assert_eq!(andy.rows[0][0].id.as_deref(), Some("item-0"));
    }

    #[test]
    fn test_completion_for_reused_slot_settles_counters_only() {
        let mut ledger = ledger(1, 2);
        let old = ledger.begin_request("Andy", "item-0", t0()).unwrap();
        let new = ledger.begin_request("Andy", "item-1", t0()).unwrap();
        assert_eq!(old.position, new.position);

        assert_eq!(
            ledger.complete_request(&old, Outcome::Fail, t0()),
            CompletionEffect::CountersOnly
        );
        let andy = ledger.state("Andy").unwrap();
        assert_eq!(andy.counters.failed, 1);
        assert_eq!(andy.counters.running, 1);
        assert!(andy.counters.is_consistent());
        assert_eq!(andy.rows[0][0].status, SlotStatus::Running);
        assert_eq!(andy.rows[0][0].id.as_deref(), Some("item-1"));
    }

    #[test]
    fn test_begin_request_errors() {
        let mut empty = ResultLedger::new(10);
        assert_eq!(
            empty.begin_request("Andy", "x", t0()).unwrap_err(),
            LedgerError::NotInitialized
        );

        let mut ledger = ledger(10, 1);
        assert_eq!(
            ledger.begin_request("Zed", "x", t0()).unwrap_err(),
            LedgerError::UnknownCompetitor("Zed".to_string())
        );
    }

    #[test]
    fn test_rename_moves_state() {
        let mut ledger = ledger(10, 1);
        assert!(ledger.rename("Andy", "Alice"));
        assert!(ledger.state("Andy").is_none());
        assert!(ledger.state("Alice").is_some());
        assert!(!ledger.rename("Nobody", "X"));
    }

    #[test]
    fn test_set_capacity_rebuilds_states() {
        let mut ledger = ledger(10, 3);
        let before = ledger.generation();
        ledger.set_capacity(75);
        let andy = ledger.state("Andy").unwrap();
        assert_eq!(andy.capacity(), 75);
        assert_eq!(andy.rows[0][2].id.as_deref(), Some("item-2"));
        assert!(ledger.generation() > before);
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let mut ledger = ledger(10, 1);
        let mut rx = ledger.subscribe();

        let ticket = ledger.begin_request("Bob", "item-0", t0()).unwrap();
        ledger.complete_request(&ticket, Outcome::Pass, t0());

        match rx.recv().await.unwrap() {
            LedgerEvent::SlotUpdated {
                competitor,
                counters,
                ..
            } => {
                assert_eq!(competitor, "Bob");
                assert_eq!(counters.running, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            LedgerEvent::SlotUpdated { slot, .. } => assert_eq!(slot.status, SlotStatus::Pass),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
