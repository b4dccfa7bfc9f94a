use coldchain_core::error::CoreError;

/// Reasons the simulator refuses an external mutation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Scenario conditions or reroute coordinates were out of range.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The pallet has been marked for disposal and no longer takes routes.
    #[error("Pallet {0} is awaiting disposal and cannot be rerouted")]
    AwaitingDisposal(String),
}
