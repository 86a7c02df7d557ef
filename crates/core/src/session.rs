//! Benchmark session.
//!
//! Owns the competitor registry, the current settings, the result ledger and
//! the dispatch scheduler, and exposes the user-level operations on them.
//!
//! Lock order is `state -> ledger -> leaderboard`; no code path acquires them
//! in the other direction. Claiming a preparation or a run happens under the
//! `state` write lock, so the two never overlap.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::client::RequestClient;
use crate::clock::Clock;
use crate::competitor::{Competitor, CompetitorRegistry, RegistryError};
use crate::config::Config;
use crate::dispatch::{
    ActionTemplate, DispatchError, DispatchStatus, DispatchTarget, Dispatcher,
};
use crate::ledger::{LedgerEvent, LedgerSnapshot, ResultLedger};
use crate::preparation::{self, PreparationError, RequestTemplate};
use crate::ranking::{rank, Leaderboard};
use crate::report::{
    render_markdown, render_sql, summarize, RenderedReport, ReportContext, ReportData, ReportError,
};
use crate::settings::{BenchSettings, SettingsError, SettingsPatch};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Preparation(#[from] PreparationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Not allowed while a run is active")]
    RunActive,

    #[error("Preparation is already in progress")]
    PreparationInProgress,

    #[error("Competitors changed during preparation; please run it again")]
    CompetitorsChanged,
}

/// Changes to one competitor.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CompetitorUpdate {
    pub token: Option<String>,
    pub name: Option<String>,
}

/// Item count fetched for one competitor.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedCompetitor {
    pub name: String,
    pub items: usize,
}

/// Outcome of the preparation stage.
#[derive(Debug, Clone, Serialize)]
pub struct PreparationSummary {
    pub competitors: Vec<PreparedCompetitor>,
    pub capacity: usize,
}

/// Ledger snapshot with ranking and scheduler status.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    #[serde(flatten)]
    pub ledger: LedgerSnapshot,
    pub ranking: Leaderboard,
    pub status: DispatchStatus,
}

struct SessionState {
    registry: CompetitorRegistry,
    competitor_count: usize,
    items_per_competitor: usize,
    preparation: RequestTemplate,
    action: ActionTemplate,
    /// Bumped whenever the competitor set or names change.
    registry_epoch: u64,
}

impl SessionState {
    fn settings(&self) -> BenchSettings {
        BenchSettings {
            competitor_count: self.competitor_count,
            items_per_competitor: self.items_per_competitor,
            competitors: self.registry.competitors().to_vec(),
            preparation: self.preparation.clone(),
            action: self.action.clone(),
        }
    }
}

pub struct BenchSession {
    config: Config,
    client: Arc<dyn RequestClient>,
    clock: Arc<dyn Clock>,
    state: RwLock<SessionState>,
    ledger: Arc<RwLock<ResultLedger>>,
    leaderboard: Arc<RwLock<Leaderboard>>,
    dispatcher: Dispatcher,
    preparing: AtomicBool,
}

impl BenchSession {
    pub fn new(
        config: Config,
        client: Arc<dyn RequestClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        let mut registry = CompetitorRegistry::new();
        registry.setup(config.bench.competitor_count)?;

        let ledger = Arc::new(RwLock::new(ResultLedger::new(
            config.bench.items_per_competitor,
        )));
        let leaderboard = Arc::new(RwLock::new(Leaderboard::new()));
        let dispatcher = Dispatcher::new(
            config.dispatch.clone(),
            Arc::clone(&client),
            Arc::clone(&clock),
            Arc::clone(&ledger),
            Arc::clone(&leaderboard),
        );

        let state = SessionState {
            registry,
            competitor_count: config.bench.competitor_count,
            items_per_competitor: config.bench.items_per_competitor,
            preparation: RequestTemplate::default(),
            action: ActionTemplate {
                requests_per_minute: config.bench.requests_per_minute,
                ..Default::default()
            },
            registry_epoch: 0,
        };

        Ok(Self {
            config,
            client,
            clock,
            state: RwLock::new(state),
            ledger,
            leaderboard,
            dispatcher,
            preparing: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.dispatcher.is_active() {
            return Err(SessionError::RunActive);
        }
        Ok(())
    }

    /// Registry mutations need both an idle scheduler and no preparation.
    fn ensure_quiescent(&self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if self.preparing.load(Ordering::SeqCst) {
            return Err(SessionError::PreparationInProgress);
        }
        Ok(())
    }

    // =========================================================================
    // Competitors
    // =========================================================================

    /// Recreate competitors from the default name pool.
    ///
    /// Uses the configured competitor count when `count` is `None`. Clears
    /// prepared items and results.
    pub async fn setup_competitors(
        &self,
        count: Option<usize>,
    ) -> Result<Vec<Competitor>, SessionError> {
        let mut state = self.state.write().await;
        self.ensure_quiescent()?;
        let count = count.unwrap_or(state.competitor_count);
        state.registry.setup(count)?;
        state.competitor_count = count;
        state.registry_epoch += 1;

        self.ledger.write().await.clear();
        self.leaderboard.write().await.clear();

        Ok(state.registry.competitors().to_vec())
    }

    pub async fn competitors(&self) -> Vec<Competitor> {
        self.state.read().await.registry.competitors().to_vec()
    }

    /// Set a competitor's token and/or rename it.
    ///
    /// Renames migrate registry items, ledger run state and ranking together
    /// and are rejected while a run or preparation is in progress.
    pub async fn update_competitor(
        &self,
        name: &str,
        update: CompetitorUpdate,
    ) -> Result<Competitor, SessionError> {
        let mut state = self.state.write().await;
        if state.registry.get(name).is_none() {
            return Err(RegistryError::NotFound(name.to_string()).into());
        }

        let mut current = name.to_string();
        if let Some(new_name) = update.name.as_deref().map(str::trim) {
            if new_name != name {
                self.ensure_quiescent()?;
                state.registry.rename(name, new_name)?;
                state.registry_epoch += 1;

                let mut ledger = self.ledger.write().await;
                if ledger.rename(name, new_name) {
                    let ranking = rank(ledger.states());
                    *self.leaderboard.write().await = ranking.clone();
                    ledger.emit(LedgerEvent::RankingChanged { ranking });
                }
                current = new_name.to_string();
            }
        }
        if let Some(token) = update.token {
            state.registry.set_token(&current, &token)?;
        }

        state
            .registry
            .get(&current)
            .cloned()
            .ok_or(SessionError::Registry(RegistryError::NotFound(current)))
    }

    // =========================================================================
    // Preparation
    // =========================================================================

    /// Fetch every active competitor's items and initialize the ledger.
    pub async fn prepare(&self) -> Result<PreparationSummary, SessionError> {
        {
            let _state = self.state.write().await;
            self.ensure_idle()?;
            if self.preparing.swap(true, Ordering::SeqCst) {
                return Err(SessionError::PreparationInProgress);
            }
        }
        let result = self.run_preparation().await;
        self.preparing.store(false, Ordering::SeqCst);
        result
    }

    async fn run_preparation(&self) -> Result<PreparationSummary, SessionError> {
        let (competitors, template, epoch) = {
            let state = self.state.read().await;
            (
                state.registry.competitors().to_vec(),
                state.preparation.clone(),
                state.registry_epoch,
            )
        };

        let items = preparation::prepare(self.client.as_ref(), &competitors, &template).await?;

        let mut state = self.state.write().await;
        if state.registry_epoch != epoch {
            return Err(SessionError::CompetitorsChanged);
        }
        self.ensure_idle()?;
        let order: Vec<String> = state
            .registry
            .competitors()
            .iter()
            .map(|c| c.name.clone())
            .collect();

        let mut ledger = self.ledger.write().await;
        ledger.initialize(&items, &order);
        self.leaderboard.write().await.clear();

        let summary = PreparationSummary {
            competitors: ledger
                .states()
                .iter()
                .map(|s| PreparedCompetitor {
                    name: s.name.clone(),
                    items: s.item_ids().len(),
                })
                .collect(),
            capacity: ledger.capacity(),
        };
        state.registry.set_items(items);

        Ok(summary)
    }

    // =========================================================================
    // Action
    // =========================================================================

    /// Start the countdown and the run.
    ///
    /// The `state` write lock is held until the run is claimed so a
    /// preparation cannot start in between.
    pub async fn start_action(&self) -> Result<Uuid, SessionError> {
        let state = self.state.write().await;
        if self.preparing.load(Ordering::SeqCst) {
            return Err(SessionError::PreparationInProgress);
        }
        let targets = state
            .registry
            .competitors()
            .iter()
            .map(|c| DispatchTarget {
                name: c.name.clone(),
                headers: c.headers().unwrap_or_default(),
            })
            .collect();
        let run_id = self.dispatcher.start(state.action.clone(), targets).await?;
        drop(state);
        Ok(run_id)
    }

    /// Stop the current run. Returns false when nothing was running.
    pub async fn stop_action(&self) -> bool {
        self.dispatcher.stop().await
    }

    pub async fn status(&self) -> DispatchStatus {
        self.dispatcher.status().await
    }

    // =========================================================================
    // Results
    // =========================================================================

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.read().await.snapshot()
    }

    pub async fn leaderboard(&self) -> Leaderboard {
        self.leaderboard.read().await.clone()
    }

    pub async fn results(&self) -> ResultsView {
        let ledger = self.snapshot().await;
        let ranking = self.leaderboard().await;
        ResultsView {
            ledger,
            ranking,
            status: self.status().await,
        }
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.ledger.read().await.subscribe()
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Aggregate the current or most recent run.
    ///
    /// `matrix_duration_secs` defaults to the configured window.
    pub async fn build_report(
        &self,
        matrix_duration_secs: Option<u64>,
    ) -> Result<ReportData, SessionError> {
        let timing = self.dispatcher.status().await.timing;
        let context = {
            let state = self.state.read().await;
            ReportContext {
                action_url: state.action.url.clone(),
                method: state.action.method,
                requests_per_minute: state.action.requests_per_minute,
            }
        };
        let matrix = matrix_duration_secs.unwrap_or(self.config.report.matrix_duration_secs);
        let ledger = self.ledger.read().await;
        Ok(summarize(
            ledger.states(),
            &timing,
            &context,
            matrix,
            self.clock.now(),
        )?)
    }

    pub async fn markdown_report(&self) -> Result<RenderedReport, SessionError> {
        let data = self.build_report(None).await?;
        Ok(render_markdown(&data, self.clock.now()))
    }

    pub async fn sql_report(
        &self,
        matrix_duration_secs: Option<u64>,
    ) -> Result<RenderedReport, SessionError> {
        let data = self.build_report(matrix_duration_secs).await?;
        Ok(render_sql(&data, self.clock.now()))
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub async fn export_settings(&self) -> BenchSettings {
        self.state.read().await.settings()
    }

    /// Merge a settings document into the session.
    ///
    /// A changed competitor list replaces the registry and clears prepared
    /// state; a changed capacity rebuilds the ledger rings.
    pub async fn import_settings(
        &self,
        patch: SettingsPatch,
    ) -> Result<BenchSettings, SessionError> {
        let mut state = self.state.write().await;
        self.ensure_quiescent()?;
        let next = patch.apply(&state.settings())?;

        if next.competitors != state.registry.competitors() {
            state.registry.replace(next.competitors.clone())?;
            state.registry_epoch += 1;
            self.ledger.write().await.clear();
            self.leaderboard.write().await.clear();
        }
        if next.items_per_competitor != state.items_per_competitor {
            self.ledger.write().await.set_capacity(next.items_per_competitor);
        }

        state.competitor_count = next.competitor_count;
        state.items_per_competitor = next.items_per_competitor;
        state.preparation = next.preparation;
        state.action = next.action;

        info!(
            competitors = state.registry.len(),
            items_per_competitor = state.items_per_competitor,
            "Settings imported"
        );
        Ok(state.settings())
    }

    /// Stop any active run.
    pub async fn shutdown(&self) {
        if self.stop_action().await {
            info!("Active run stopped on shutdown");
        }
    }
}
