use chrono::{DateTime, Duration, TimeZone};
use log::warn;

use crate::error::FlightError;
use crate::geo::{self, City};
use crate::session::{MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};
use crate::util::format_minutes;

/// A planned trip between two cities. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub from: City,
    pub to: City,
    pub distance_km: u32,
    pub duration_min: u32,
    pub flight_number: String,
}

impl Route {
    pub fn plan(from: &City, to: &City) -> Result<Self, FlightError> {
        if from.id == to.id {
            return Err(FlightError::SameCity(from.name.clone()));
        }

        let distance_km = geo::distance(from, to);
        Ok(Self {
            from: from.clone(),
            to: to.clone(),
            distance_km,
            duration_min: geo::estimate_duration(distance_km),
            flight_number: geo::flight_number(from, to),
        })
    }

    pub fn plan_by_name(from: &str, to: &str) -> Result<Self, FlightError> {
        let from =
            geo::city_by_name(from).ok_or_else(|| FlightError::CityNotFound(from.to_string()))?;
        let to = geo::city_by_name(to).ok_or_else(|| FlightError::CityNotFound(to.to_string()))?;
        Self::plan(from, to)
    }

    /// Override the estimated flight time with an explicit one
    pub fn with_duration(mut self, minutes: u32) -> Result<Self, FlightError> {
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&minutes) {
            return Err(FlightError::InvalidDuration {
                got: minutes as i64,
                min: MIN_SESSION_MINUTES,
                max: MAX_SESSION_MINUTES,
            });
        }
        self.duration_min = minutes;
        Ok(self)
    }

    pub fn duration_text(&self) -> String {
        format_minutes(self.duration_min)
    }
}

/// Preset trips with a fixed flight time regardless of distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopularRoute {
    pub from: &'static str,
    pub to: &'static str,
    pub target_minutes: u32,
}

pub const POPULAR_ROUTES: [PopularRoute; 4] = [
    PopularRoute {
        from: "Beijing",
        to: "Tianjin",
        target_minutes: 10,
    },
    PopularRoute {
        from: "Shanghai",
        to: "Suzhou",
        target_minutes: 15,
    },
    PopularRoute {
        from: "Beijing",
        to: "Shijiazhuang",
        target_minutes: 20,
    },
    PopularRoute {
        from: "Beijing",
        to: "Xi'an",
        target_minutes: 30,
    },
];

pub fn popular_routes() -> Vec<Route> {
    POPULAR_ROUTES
        .iter()
        .filter_map(|p| {
            match Route::plan_by_name(p.from, p.to).and_then(|r| r.with_duration(p.target_minutes))
            {
                Ok(route) => Some(route),
                Err(e) => {
                    warn!("skipping popular route {} -> {}: {e}", p.from, p.to);
                    None
                }
            }
        })
        .collect()
}

/// Cosmetic boarding time shown on the ticket: five minutes from `now`
pub fn departure_time<Tz: TimeZone>(now: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    (now + Duration::minutes(5)).format("%H:%M").to_string()
}
