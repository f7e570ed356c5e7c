use thiserror::Error;

/// Domain errors of the simulation core.
///
/// `Busy` and `NothingToInterrupt` are expected outcomes that surface to the
/// agent as tool results; none of these variants is fatal to the loops.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PetError {
    #[error("the dog is busy {description} and cannot start a new behavior")]
    Busy { description: String },

    #[error("the dog is not doing anything that needs interrupting")]
    NothingToInterrupt,

    #[error("behavior duration must be a positive number of virtual minutes, got {0}")]
    InvalidDuration(f64),

    #[error("time scale must be positive and finite, got {0}")]
    InvalidTimeScale(f64),

    #[error("action failed: {0}")]
    ActionExecution(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

pub type PetResult<T> = Result<T, PetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_message_names_behavior() {
        let e = PetError::Busy {
            description: "sleeping".into(),
        };
        assert!(e.to_string().contains("busy sleeping"));
    }
}
