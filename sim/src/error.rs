use crate::simulation::Phase;
use shared::ConfigError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("operation needs phase {expected:?}, simulation is in {actual:?}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("simulation already finished")]
    Finished,
}
