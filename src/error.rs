//! Error types shared by every stage of the reserve pipeline

use thiserror::Error;

/// Errors raised while loading tables, resolving assumptions or running a reserve model
#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("rate table not found: {0}")]
    TableNotFound(String),

    #[error("rate table {table} is malformed: {message}")]
    TableFormat { table: String, message: String },

    #[error("no rate in table {table} for key {key}")]
    Lookup { table: String, key: String },

    #[error("unknown assumption set: {0}")]
    UnknownAssumptionSet(String),

    #[error("unknown model mode: {0}")]
    UnknownMode(String),

    #[error("unknown benefit period: {0}")]
    UnknownBenefitPeriod(String),

    #[error("unknown net benefit method: {0}")]
    UnknownNetBenefitMethod(String),

    #[error("unknown {field}: {value}")]
    UnknownCode { field: &'static str, value: String },

    #[error("{0} is not implemented")]
    NotImplemented(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("failed to acquire lock on {0}")]
    LockPoisoned(&'static str),

    #[error("step '{step}' failed")]
    Step {
        step: &'static str,
        #[source]
        source: Box<ReserveError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReserveError>;

/// Label the pipeline step a fallible call belongs to
pub trait StepExt<T> {
    fn step(self, step: &'static str) -> Result<T>;
}

impl<T> StepExt<T> for Result<T> {
    fn step(self, step: &'static str) -> Result<T> {
        self.map_err(|e| e.in_step(step))
    }
}

impl ReserveError {
    pub fn lookup(table: impl Into<String>, key: impl Into<String>) -> Self {
        ReserveError::Lookup { table: table.into(), key: key.into() }
    }

    pub fn table_format(table: impl Into<String>, message: impl Into<String>) -> Self {
        ReserveError::TableFormat { table: table.into(), message: message.into() }
    }

    /// Attach the name of the pipeline step that produced this error
    pub fn in_step(self, step: &'static str) -> Self {
        ReserveError::Step { step, source: Box::new(self) }
    }

    /// The innermost error, skipping step annotations
    pub fn root(&self) -> &ReserveError {
        match self {
            ReserveError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classification written to error records
    pub fn kind(&self) -> &'static str {
        match self.root() {
            ReserveError::UnknownAssumptionSet(_)
            | ReserveError::UnknownMode(_)
            | ReserveError::UnknownBenefitPeriod(_)
            | ReserveError::UnknownNetBenefitMethod(_)
            | ReserveError::UnknownCode { .. } => "ConfigurationError",
            ReserveError::TableNotFound(_) | ReserveError::Lookup { .. } => "LookupError",
            ReserveError::NotImplemented(_) => "NotImplementedError",
            ReserveError::TableFormat { .. } | ReserveError::InvalidRecord(_) => "DataError",
            ReserveError::Io(_) | ReserveError::Csv(_) | ReserveError::Json(_) => "IoError",
            ReserveError::LockPoisoned(_) | ReserveError::Step { .. } => "InternalError",
        }
    }

    /// Step names and messages from the outermost error down to its root cause
    pub fn trace(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = current {
            lines.push(err.to_string());
            current = err.source();
        }
        lines
    }
}
