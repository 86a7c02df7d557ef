//! Dispatch scheduler implementation.
//!
//! One task per run drives the countdown and then fires a tick every
//! `60s / requests_per_minute`. Each tick dispatches one request per
//! competitor; requests run in their own tasks and report back over a
//! channel, so completions are applied to the ledger one at a time by the
//! run task. Stopping halts ticks but lets in-flight requests settle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::DispatchConfig;
use super::types::{ActionTemplate, DispatchError, DispatchStatus, DispatchTarget, SchedulerState};
use crate::client::{ApiRequest, RequestBody, RequestClient};
use crate::clock::Clock;
use crate::ledger::{CompletionEffect, LedgerEvent, Outcome, ResultLedger, SlotTicket};
use crate::metrics::{REQUESTS_COMPLETED, REQUESTS_DISPATCHED, REQUESTS_IN_FLIGHT, REQUEST_DURATION};
use crate::ranking::{rank, Leaderboard};

/// A settled request on its way back to the run task.
struct Completion {
    ticket: SlotTicket,
    outcome: Outcome,
}

/// Per-competitor cursor over its item ids.
struct Lane {
    target: DispatchTarget,
    item_ids: Vec<String>,
    next_index: usize,
}

impl Lane {
    fn next_item(&mut self) -> &str {
        let index = self.next_index % self.item_ids.len();
        self.next_index += 1;
        &self.item_ids[index]
    }
}

/// Shared handles cloned into the run task.
#[derive(Clone)]
struct RunContext {
    run_id: Uuid,
    config: DispatchConfig,
    client: Arc<dyn RequestClient>,
    clock: Arc<dyn Clock>,
    ledger: Arc<RwLock<ResultLedger>>,
    leaderboard: Arc<RwLock<Leaderboard>>,
    status: Arc<RwLock<DispatchStatus>>,
}

/// The dispatch scheduler.
pub struct Dispatcher {
    config: DispatchConfig,
    client: Arc<dyn RequestClient>,
    clock: Arc<dyn Clock>,
    ledger: Arc<RwLock<ResultLedger>>,
    leaderboard: Arc<RwLock<Leaderboard>>,

    // Runtime state
    status: Arc<RwLock<DispatchStatus>>,
    active: AtomicBool,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl Dispatcher {
    pub fn new(
        config: DispatchConfig,
        client: Arc<dyn RequestClient>,
        clock: Arc<dyn Clock>,
        ledger: Arc<RwLock<ResultLedger>>,
        leaderboard: Arc<RwLock<Leaderboard>>,
    ) -> Self {
        Self {
            config,
            client,
            clock,
            ledger,
            leaderboard,
            status: Arc::new(RwLock::new(DispatchStatus::default())),
            active: AtomicBool::new(false),
            stop_tx: Mutex::new(None),
        }
    }

    /// Validate preconditions, reset the ledger and spawn the run task.
    pub async fn start(
        &self,
        action: ActionTemplate,
        targets: Vec<DispatchTarget>,
    ) -> Result<Uuid, DispatchError> {
        if self.active.load(Ordering::SeqCst) {
            return Err(DispatchError::AlreadyRunning);
        }
        action.validate()?;
        let period = action.tick_interval().ok_or(DispatchError::InvalidRate)?;

        let lanes = {
            let ledger = self.ledger.read().await;
            if !ledger.is_initialized() {
                return Err(DispatchError::NotPrepared);
            }
            let lanes: Vec<Lane> = targets
                .into_iter()
                .filter_map(|target| {
                    let item_ids = ledger.state(&target.name)?.item_ids().to_vec();
                    (!item_ids.is_empty()).then_some(Lane {
                        target,
                        item_ids,
                        next_index: 0,
                    })
                })
                .collect();
            if lanes.is_empty() {
                return Err(DispatchError::NoItems);
            }
            lanes
        };

        if self.active.swap(true, Ordering::SeqCst) {
            return Err(DispatchError::AlreadyRunning);
        }

        let run_id = Uuid::new_v4();
        let now = self.clock.now();

        self.ledger.write().await.reset();
        self.leaderboard.write().await.clear();
        {
            let mut status = self.status.write().await;
            *status = DispatchStatus {
                state: SchedulerState::Idle,
                timing: Default::default(),
                ticks: 0,
                requests_per_minute: action.requests_per_minute,
            };
            status.timing.run_id = Some(run_id);
            status.timing.pressed_at = Some(now);
        }
        self.ledger.read().await.emit(LedgerEvent::RankingChanged {
            ranking: Leaderboard::new(),
        });

        let (stop_tx, stop_rx) = oneshot::channel();
        if let Ok(mut slot) = self.stop_tx.lock() {
            *slot = Some(stop_tx);
        }

        info!(
            %run_id,
            competitors = lanes.len(),
            requests_per_minute = action.requests_per_minute,
            url = %action.url,
            "Starting dispatch run"
        );

        let ctx = RunContext {
            run_id,
            config: self.config.clone(),
            client: Arc::clone(&self.client),
            clock: Arc::clone(&self.clock),
            ledger: Arc::clone(&self.ledger),
            leaderboard: Arc::clone(&self.leaderboard),
            status: Arc::clone(&self.status),
        };
        tokio::spawn(run(ctx, action, lanes, period, stop_rx));

        Ok(run_id)
    }

    /// Stop the current run. Returns false when nothing was running.
    ///
    /// Ticks and any pending countdown stop immediately; requests already in
    /// flight still settle into the ledger.
    pub async fn stop(&self) -> bool {
        let stop_tx = match self.stop_tx.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        let Some(stop_tx) = stop_tx else {
            return false;
        };
        let _ = stop_tx.send(());

        let now = self.clock.now();
        {
            let mut status = self.status.write().await;
            status.state = SchedulerState::Idle;
            status.timing.stopped_at = Some(now);
        }
        self.active.store(false, Ordering::SeqCst);
        self.ledger.read().await.emit(LedgerEvent::SchedulerState {
            state: SchedulerState::Idle,
        });

        info!("Dispatch run stopped");
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> DispatchStatus {
        self.status.read().await.clone()
    }
}

/// Move the run to `state` unless it was stopped or superseded meanwhile.
async fn transition(ctx: &RunContext, state: SchedulerState) -> bool {
    {
        let mut status = ctx.status.write().await;
        if status.timing.run_id != Some(ctx.run_id) || status.timing.stopped_at.is_some() {
            return false;
        }
        status.state = state;
        if state == SchedulerState::Running {
            status.timing.actual_start = Some(ctx.clock.now());
        }
    }
    ctx.ledger
        .read()
        .await
        .emit(LedgerEvent::SchedulerState { state });
    true
}

async fn run(
    ctx: RunContext,
    action: ActionTemplate,
    mut lanes: Vec<Lane>,
    period: std::time::Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    for remaining in (1..=ctx.config.countdown_steps).rev() {
        if !transition(&ctx, SchedulerState::CountingDown { remaining }).await {
            return;
        }
        tokio::select! {
            biased;
            _ = &mut stop_rx => {
                info!(run_id = %ctx.run_id, "Countdown cancelled");
                return;
            }
            _ = tokio::time::sleep(ctx.config.countdown_interval()) => {}
        }
    }

    if !transition(&ctx, SchedulerState::Running).await {
        return;
    }
    info!(run_id = %ctx.run_id, period_ms = period.as_millis() as u64, "Dispatch running");

    let body = RequestBody::from_template(&action.body);
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<Completion>();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                tick(&ctx, &action, &body, &mut lanes, &completion_tx).await;
            }
            Some(completion) = completion_rx.recv() => {
                apply_completion(&ctx, completion).await;
            }
        }
    }

    // Let in-flight requests settle.
    drop(completion_tx);
    let mut drained = 0usize;
    while let Some(completion) = completion_rx.recv().await {
        apply_completion(&ctx, completion).await;
        drained += 1;
    }
    info!(run_id = %ctx.run_id, drained, "Dispatch run finished");
}

/// Dispatch one request per lane.
async fn tick(
    ctx: &RunContext,
    action: &ActionTemplate,
    body: &RequestBody,
    lanes: &mut [Lane],
    completion_tx: &mpsc::UnboundedSender<Completion>,
) {
    let now = ctx.clock.now();
    let mut dispatches = Vec::with_capacity(lanes.len());
    {
        let mut ledger = ctx.ledger.write().await;
        for lane in lanes.iter_mut() {
            let item_id = lane.next_item().to_string();
            match ledger.begin_request(&lane.target.name, &item_id, now) {
                Ok(ticket) => dispatches.push((ticket, lane.target.headers.clone())),
                Err(e) => warn!(competitor = %lane.target.name, error = %e, "Dispatch skipped"),
            }
        }
    }
    ctx.status.write().await.ticks += 1;

    for (ticket, headers) in dispatches {
        let request = ApiRequest {
            method: action.method,
            url: action.render_url(&ticket.item_id),
            body: body.clone(),
            headers,
        };
        debug!(
            competitor = %ticket.competitor,
            item_id = %ticket.item_id,
            row = ticket.position.row,
            col = ticket.position.col,
            "Dispatching request"
        );
        REQUESTS_DISPATCHED
            .with_label_values(&[ticket.competitor.as_str()])
            .inc();
        REQUESTS_IN_FLIGHT.inc();

        let client = Arc::clone(&ctx.client);
        let completion_tx = completion_tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match client.send(request).await {
                Ok(response) if response.is_successful() => Outcome::Pass,
                Ok(response) => {
                    debug!(
                        competitor = %ticket.competitor,
                        reason = %response.failure_reason(),
                        "Action request failed"
                    );
                    Outcome::Fail
                }
                Err(e) => {
                    debug!(competitor = %ticket.competitor, error = %e, "Action request error");
                    Outcome::Fail
                }
            };
            REQUESTS_IN_FLIGHT.dec();
            REQUEST_DURATION
                .with_label_values(&[outcome.as_str()])
                .observe(started.elapsed().as_secs_f64());
            let _ = completion_tx.send(Completion { ticket, outcome });
        });
    }
}

/// Settle one completion and refresh the leaderboard on a pass.
async fn apply_completion(ctx: &RunContext, completion: Completion) {
    let Completion { ticket, outcome } = completion;
    REQUESTS_COMPLETED
        .with_label_values(&[ticket.competitor.as_str(), outcome.as_str()])
        .inc();

    let mut ledger = ctx.ledger.write().await;
    let effect = ledger.complete_request(&ticket, outcome, ctx.clock.now());
    if effect == CompletionEffect::Discarded || outcome != Outcome::Pass {
        return;
    }

    let ranking = rank(ledger.states());
    *ctx.leaderboard.write().await = ranking.clone();
    ledger.emit(LedgerEvent::RankingChanged { ranking });
}
