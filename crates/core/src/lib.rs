pub mod client;
pub mod clock;
pub mod competitor;
pub mod config;
pub mod dispatch;
pub mod ledger;
pub mod metrics;
pub mod preparation;
pub mod ranking;
pub mod report;
pub mod session;
pub mod settings;
pub mod testing;

pub use client::{ApiRequest, ApiResponse, ClientError, HttpMethod, HttpRequestClient, RequestClient};
pub use clock::{Clock, TokioClock};
pub use competitor::{Competitor, CompetitorRegistry, RegistryError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError,
};
pub use dispatch::{ActionTemplate, DispatchConfig, DispatchError, DispatchStatus, SchedulerState};
pub use ledger::{LedgerEvent, LedgerSnapshot, ResultLedger, SlotStatus};
pub use preparation::{Item, PreparationError, RequestTemplate};
pub use ranking::{rank, Leaderboard, RankClass, RankingEntry};
pub use report::{RenderedReport, ReportData, ReportError};
pub use session::{BenchSession, CompetitorUpdate, SessionError};
pub use settings::{BenchSettings, SettingsError, SettingsPatch};
