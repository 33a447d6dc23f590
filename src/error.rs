use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Found state {state} {count} times")]
    AmbiguousState { state: String, count: usize },

    #[error("No history entries to span for experiment {experiment_id}")]
    EmptyTimeline { experiment_id: String },

    #[error("Invalid cache key: {0:?}")]
    InvalidCacheKey(String),

    #[error("Consistency check failed: {0}")]
    Consistency(String),

    #[error("Fetch worker did not complete: {0}")]
    WorkerPanic(String),

    #[error("Failed to {operation} for experiment \"{experiment_id}\"")]
    Experiment {
        experiment_id: String,
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the experiment id and failing operation to an error
    pub fn for_experiment(self, experiment_id: &str, operation: &'static str) -> Self {
        Error::Experiment {
            experiment_id: experiment_id.to_string(),
            operation,
            source: Box::new(self),
        }
    }

    /// Experiment id this error was raised for, if it carries one
    pub fn experiment_id(&self) -> Option<&str> {
        match self {
            Error::Experiment { experiment_id, .. } => Some(experiment_id),
            Error::EmptyTimeline { experiment_id } => Some(experiment_id),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::WorkerPanic(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
