use thiserror::Error;

/// Failures raised by a key-value backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can go wrong while planning, flying or logging a flight.
///
/// None of these are fatal: callers log them and tell the user the action
/// did not happen.
#[derive(Debug, Error)]
pub enum FlightError {
    #[error("duration must be between {min} and {max} minutes (got {got})")]
    InvalidDuration { got: i64, min: u32, max: u32 },

    #[error("origin and destination are both {0}")]
    SameCity(String),

    #[error("unknown city: {0}")]
    CityNotFound(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("storage failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("flight log could not be read, refusing to write over it")]
    LogUnreadable,
}

impl FlightError {
    /// Short message suitable for a toast line in the UI
    pub fn user_message(&self) -> String {
        match self {
            FlightError::InvalidDuration { .. } => "Flight time is out of range".to_string(),
            FlightError::SameCity(_) => "Origin and destination cannot be the same".to_string(),
            FlightError::CityNotFound(name) => format!("No airport found for {name}"),
            FlightError::InvalidSetting(reason) => reason.clone(),
            FlightError::Persistence(_) => "Could not save, please try again".to_string(),
            FlightError::LogUnreadable => {
                "Flight log is unreadable, new flights will not be saved".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_duration_message_names_bounds() {
        let err = FlightError::InvalidDuration {
            got: 0,
            min: 1,
            max: 180,
        };
        assert_eq!(
            err.to_string(),
            "duration must be between 1 and 180 minutes (got 0)"
        );
    }

    #[test]
    fn store_errors_convert_into_persistence() {
        let err: FlightError = StoreError::Unavailable("disk full".into()).into();
        assert!(matches!(err, FlightError::Persistence(_)));
        assert_eq!(err.user_message(), "Could not save, please try again");
    }
}
