// Signal Generation
// Signal lifecycle core: random draws, lifecycle controller, history ledger
// and the async service that drives them on timers

pub mod config;
pub mod controller;
pub mod draw;
pub mod ledger;
pub mod notify;
pub mod random;
pub mod service;
pub mod timer;

pub use config::{load_config, save_config, create_config_template, ConfidenceModel, ConfigError, SignalConfig};
pub use controller::{GenerationTicket, LifecycleState, RequestOutcome, SignalController, SignalView, TickOutcome};
pub use draw::{build_draw, MinesDraw, RocketDraw, SignalDraw};
pub use ledger::HistoryLedger;
pub use notify::{ActivationNotifier, ChannelNotifier, LogNotifier, NoopNotifier};
pub use random::{ConstantSource, RandomSource, ScriptedSource, SeededSource};
pub use service::{SignalHandle, SignalService};
pub use timer::TimerHandle;
