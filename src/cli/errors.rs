use thiserror::Error;

use modisnrt::{PipelineStage, PipelineState};

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[source] modisnrt::Error),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: modisnrt::Error,
    },

    #[error("{0}")]
    Setup(#[source] modisnrt::Error),
}

impl AppError {
    /// Attach the stage a pipeline stopped in, when it stopped in one.
    pub fn from_run_failure(state: PipelineState, source: modisnrt::Error) -> Self {
        match state {
            PipelineState::Failed(stage) => AppError::Stage { stage, source },
            _ => AppError::Setup(source),
        }
    }

    /// Process exit status; every failure, a missing image included, is 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
