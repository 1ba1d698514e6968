#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing required column `{0}`")]
    MissingColumn(String),
    #[error("null value in required column `{column}` at row {row}")]
    NullValue { column: String, row: usize },
    #[error("vehicle #{vehicle_id} is observed more than once at frame #{frame_id}")]
    DuplicateObservation { vehicle_id: i64, frame_id: i64 },
    #[error("vehicle #{vehicle_id} matches more than one preceding record at frame #{frame_id}")]
    AmbiguousPrecedingMatch { vehicle_id: i64, frame_id: i64 },
    #[error("row count changed from {expected} to {actual}")]
    RowCountMismatch { expected: usize, actual: usize },
    #[error("unknown vehicle class code: {0}")]
    UnknownVehicleClass(i64),
    #[error("timestamp {0}ms is out of range")]
    InvalidTimestamp(i64),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to parse the configuration file")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read the configuration file")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "frame")]
    #[error("invalid column name pattern")]
    Regex(#[from] regex::Error),
    #[cfg(feature = "frame")]
    #[error("dataframe operation failed")]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, Error>;
