//! Assembly of the pipeline's long-running components.
//!
//! [`spawn_pipeline`] starts the simulator, both agents and the state
//! tracker as supervised tasks on one bus. [`Pipeline::shutdown`] cancels
//! them, waits a bounded time, and closes the bus.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use coldchain_agents::logistics::LOGISTICS_TOPICS;
use coldchain_agents::monitoring::MONITORING_TOPICS;
use coldchain_agents::{LogisticsAgent, MonitoringAgent, RegistryError, WarehouseRegistry};
use coldchain_events::{EventBus, PollConfig};
use coldchain_ledger::{
    BreachLedger, LedgerError, NotifyingLedger, PalletStateStore, RpcLedger, RpcLedgerConfig,
    SimulatedLedger,
};
use coldchain_simulator::{
    DefaultScenario, PalletConfig, PalletSimulator, RandomNoise, Scenario, SimulationRunner,
};

use crate::config::{LedgerMode, LedgerSettings, PipelineConfig, SimulationSettings};
use crate::state::AppState;
use crate::supervisor::{supervise, BackoffConfig, ConsumerTask, Supervised};
use crate::tracker::{PipelineStats, StateTracker, TRACKER_TOPICS};

/// Build the configured ledger backend, wrapped so that every successful
/// record is announced on `ledger_feedback`.
pub fn build_ledger(
    settings: &LedgerSettings,
    bus: Arc<EventBus>,
) -> Result<Arc<dyn BreachLedger>, LedgerError> {
    let ledger: Arc<dyn BreachLedger> = match settings.mode {
        LedgerMode::Simulation => Arc::new(NotifyingLedger::new(SimulatedLedger::default(), bus)),
        LedgerMode::Rpc => {
            let mut config =
                RpcLedgerConfig::new(settings.rpc_url.clone(), settings.contract_address.clone());
            config.from_account = settings.account.clone();
            config.confirmation_timeout = settings.confirmation_timeout;
            Arc::new(NotifyingLedger::new(RpcLedger::new(config)?, bus))
        }
    };
    tracing::info!(backend = ledger.backend_name(), "Ledger backend ready");
    Ok(ledger)
}

/// Load the warehouse network from `config.warehouses_file`, or fall back
/// to the built-in one.
pub fn load_registry(config: &PipelineConfig) -> Result<WarehouseRegistry, RegistryError> {
    let registry = match &config.warehouses_file {
        Some(path) => WarehouseRegistry::from_file(path)?,
        None => WarehouseRegistry::default(),
    };
    tracing::info!(warehouses = registry.len(), "Warehouse registry loaded");
    Ok(registry)
}

/// Simulator for the configured pallet, driven by OS randomness.
pub fn build_simulator(settings: &SimulationSettings) -> PalletSimulator {
    let pallet = PalletConfig::new(settings.pallet_id.clone(), settings.origin, settings.destination)
        .with_temperatures(settings.ideal_temp, settings.max_temp);
    PalletSimulator::new(pallet, Box::new(RandomNoise::from_os()))
}

/// Handles to the running component tasks.
pub struct Pipeline {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Pipeline {
    /// Token observed by every task; cancelling it starts shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every task and wait up to `grace` for each to finish.
    pub async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        for (name, handle) in self.tasks {
            match tokio::time::timeout(grace, handle).await {
                Ok(Ok(())) => tracing::debug!(task = name, "Task joined"),
                Ok(Err(e)) => tracing::error!(task = name, error = %e, "Task panicked"),
                Err(_) => tracing::warn!(task = name, "Task did not stop in time"),
            }
        }
    }
}

/// Everything [`spawn_pipeline`] needs besides the configuration.
pub struct PipelineParts<S> {
    pub state: AppState,
    pub registry: WarehouseRegistry,
    pub runner: SimulationRunner<S>,
}

/// Build the parts for `config` with the default traffic-jam scenario.
pub fn build_parts(
    config: &PipelineConfig,
    bus: Arc<EventBus>,
) -> Result<PipelineParts<DefaultScenario>, PipelineError> {
    let ledger = build_ledger(&config.ledger, Arc::clone(&bus))?;
    let registry = load_registry(config)?;
    let runner = SimulationRunner::new(
        build_simulator(&config.simulation),
        DefaultScenario::default(),
        Arc::clone(&bus),
    )
    .with_step_interval(config.simulation.step_interval);

    let state = AppState {
        bus,
        store: Arc::new(PalletStateStore::new()),
        stats: Arc::new(PipelineStats::default()),
        ledger,
    };

    Ok(PipelineParts {
        state,
        registry,
        runner,
    })
}

/// Spawn the tracker, both agents and the simulator.
pub fn spawn_pipeline<S>(
    parts: PipelineParts<S>,
    alert_threshold: f64,
    poll: PollConfig,
    backoff: BackoffConfig,
) -> Pipeline
where
    S: Scenario + 'static,
{
    let PipelineParts {
        state,
        registry,
        runner,
    } = parts;
    let cancel = CancellationToken::new();
    let bus = &state.bus;

    // Consumers subscribe here, before anything is spawned, so the
    // simulator's first packet has an audience.
    let tracker = ConsumerTask::new(
        "state_tracker",
        Arc::clone(bus),
        &TRACKER_TOPICS,
        StateTracker::new(Arc::clone(&state.store), Arc::clone(&state.stats)),
        poll,
    );
    let monitoring = ConsumerTask::new(
        "monitoring_agent",
        Arc::clone(bus),
        &MONITORING_TOPICS,
        MonitoringAgent::new(Arc::clone(bus), alert_threshold),
        poll,
    );
    let logistics = ConsumerTask::new(
        "logistics_agent",
        Arc::clone(bus),
        &LOGISTICS_TOPICS,
        LogisticsAgent::new(Arc::clone(bus), registry, Arc::clone(&state.ledger)),
        poll,
    );

    let tasks = vec![
        spawn_supervised("state_tracker", tracker, backoff, cancel.clone()),
        spawn_supervised("monitoring_agent", monitoring, backoff, cancel.clone()),
        spawn_supervised("logistics_agent", logistics, backoff, cancel.clone()),
        spawn_supervised("simulator", runner, backoff, cancel.clone()),
    ];
    tracing::info!(tasks = tasks.len(), "Pipeline components started");

    Pipeline { cancel, tasks }
}

fn spawn_supervised<T>(
    name: &'static str,
    mut task: T,
    backoff: BackoffConfig,
    cancel: CancellationToken,
) -> (&'static str, JoinHandle<()>)
where
    T: Supervised + 'static,
{
    let handle = tokio::spawn(async move {
        supervise(name, &mut task, &backoff, cancel).await;
    });
    (name, handle)
}

/// Startup failures of the pipeline runtime.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
