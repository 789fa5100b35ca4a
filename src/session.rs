use serde::{Deserialize, Serialize};

use crate::error::FlightError;
use crate::geo::{self, City};
use crate::route::Route;

pub const MIN_SESSION_MINUTES: u32 = 1;
pub const MAX_SESSION_MINUTES: u32 = 180;

/// Everything the timer needs to fly one route. Consumed once.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub from: City,
    pub to: City,
    pub duration_min: u32,
    pub flight_number: String,
    pub distance_km: u32,
}

impl From<&Route> for SessionConfig {
    fn from(route: &Route) -> Self {
        Self {
            from: route.from.clone(),
            to: route.to.clone(),
            duration_min: route.duration_min,
            flight_number: route.flight_number.clone(),
            distance_km: route.distance_km,
        }
    }
}

impl SessionConfig {
    /// Rebuild a config from the flat hand-off parameters, resolving city names
    pub fn from_params(params: &SessionParams) -> Result<Self, FlightError> {
        let from = geo::city_by_name(&params.from_city_name)
            .ok_or_else(|| FlightError::CityNotFound(params.from_city_name.clone()))?;
        let to = geo::city_by_name(&params.to_city_name)
            .ok_or_else(|| FlightError::CityNotFound(params.to_city_name.clone()))?;

        if from.id == to.id {
            return Err(FlightError::SameCity(from.name.clone()));
        }

        Ok(Self {
            from: from.clone(),
            to: to.clone(),
            duration_min: params.duration_min,
            flight_number: params.flight_number.clone(),
            distance_km: params.distance_km,
        })
    }

    pub fn to_params(&self) -> SessionParams {
        SessionParams {
            from_city_name: self.from.name.clone(),
            to_city_name: self.to.name.clone(),
            duration_min: self.duration_min,
            flight_number: self.flight_number.clone(),
            distance_km: self.distance_km,
        }
    }
}

/// Flat parameter set passed from route selection to the flight view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub from_city_name: String,
    pub to_city_name: String,
    pub duration_min: u32,
    pub flight_number: String,
    pub distance_km: u32,
}

/// Transient countdown state owned by the running timer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub remaining_sec: u32,
    pub total_sec: u32,
    pub paused: bool,
    pub completed: bool,
    pub started_at_epoch_ms: i64,
}

impl SessionState {
    pub fn new(total_sec: u32, started_at_epoch_ms: i64) -> Self {
        Self {
            remaining_sec: total_sec,
            total_sec,
            paused: false,
            completed: false,
            started_at_epoch_ms,
        }
    }

    pub fn focused_sec(&self) -> u32 {
        self.total_sec - self.remaining_sec
    }
}
