//! Error types shared by the solver, the instance loader and the experiment runner.

#[derive(Debug)]
pub enum GaError {
    /// A GA parameter is outside its valid range.
    Configuration {
        parameter: &'static str,
        reason: String,
    },
    /// Total worker capacity cannot cover every task.
    CapacityInfeasible {
        tasks: usize,
        workers: usize,
        calls_max: usize,
    },
    /// The task-time matrix is malformed.
    InvalidInstance(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl GaError {
    pub fn configuration(parameter: &'static str, reason: impl Into<String>) -> Self {
        GaError::Configuration {
            parameter,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for GaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GaError::Configuration { parameter, reason } => {
                write!(f, "Invalid configuration for '{}': {}", parameter, reason)
            }
            GaError::CapacityInfeasible {
                tasks,
                workers,
                calls_max,
            } => write!(
                f,
                "{} tasks cannot fit in {} workers with at most {} tasks each (total capacity {})",
                tasks,
                workers,
                calls_max,
                workers * calls_max
            ),
            GaError::InvalidInstance(msg) => write!(f, "Invalid instance: {}", msg),
            GaError::Io(e) => write!(f, "I/O error: {}", e),
            GaError::Csv(e) => write!(f, "CSV error: {}", e),
            GaError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for GaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GaError::Io(e) => Some(e),
            GaError::Csv(e) => Some(e),
            GaError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GaError {
    fn from(e: std::io::Error) -> Self {
        GaError::Io(e)
    }
}

impl From<csv::Error> for GaError {
    fn from(e: csv::Error) -> Self {
        GaError::Csv(e)
    }
}

impl From<serde_json::Error> for GaError {
    fn from(e: serde_json::Error) -> Self {
        GaError::Json(e)
    }
}

pub type GaResult<T> = std::result::Result<T, GaError>;
