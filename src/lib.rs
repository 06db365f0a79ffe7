pub mod agent_engine;
pub mod commands;
pub mod config;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent_engine::engine::{DeviceBridge, TaskRunner};
pub use agent_engine::event_bus::{AgentEvent, EventBus, Observer};
pub use agent_engine::state::{Action, TaskRun, TerminationCause};
pub use commands::AgentHandle;
pub use errors::{PhoneClawError, PhoneClawResult};

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the default
/// `info` filter. Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
