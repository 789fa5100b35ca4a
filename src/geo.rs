use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::OnceLock;

static DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/data");
static CATALOG: OnceLock<Catalog> = OnceLock::new();

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Average cruise speed used to turn distance into flight time
pub const CRUISE_SPEED_KMH: f64 = 800.0;
pub const MIN_FLIGHT_MINUTES: u32 = 15;
pub const MAX_FLIGHT_MINUTES: u32 = 180;
pub const FLIGHT_PREFIX: &str = "FF";
pub const HOME_CITY: &str = "Beijing";

/// An airport city. Immutable; unique by `id` and by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub code: String,
}

#[derive(Deserialize, Debug)]
struct Catalog {
    cities: Vec<City>,
}

fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| {
        read_catalog_from_file("cities.json").expect("embedded city table must deserialize")
    })
}

fn read_catalog_from_file(file_name: &str) -> Result<Catalog, Box<dyn Error>> {
    let file = DATA_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("{file_name} is not embedded"))?;

    let contents = file
        .contents_utf8()
        .ok_or("city table is not valid utf-8")?;

    Ok(serde_json::from_str(contents)?)
}

pub fn all_cities() -> &'static [City] {
    &catalog().cities
}

pub fn city_by_id(id: u32) -> Option<&'static City> {
    all_cities().iter().find(|c| c.id == id)
}

/// Case-insensitive lookup; surrounding whitespace is ignored
pub fn city_by_name(name: &str) -> Option<&'static City> {
    let name = name.trim();
    all_cities()
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Origin preselected before the user has chosen a default city
pub fn home_city() -> &'static City {
    city_by_name(HOME_CITY).unwrap_or(&all_cities()[0])
}

/// Great-circle distance in kilometres between two coordinates
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Rounded great-circle distance between two cities
pub fn distance(a: &City, b: &City) -> u32 {
    haversine_km(a.lat, a.lng, b.lat, b.lng).round() as u32
}

/// Flight time in minutes for a distance: cruise-speed estimate clamped to
/// [15, 180] and snapped to a multiple of five.
pub fn estimate_duration(distance_km: u32) -> u32 {
    let raw = (distance_km as f64 / CRUISE_SPEED_KMH * 60.0).round() as u32;
    let clamped = raw.clamp(MIN_FLIGHT_MINUTES, MAX_FLIGHT_MINUTES);
    ((clamped as f64 / 5.0).round() as u32) * 5
}

pub fn flight_number(from: &City, to: &City) -> String {
    flight_number_with_rng(from, to, &mut rand::thread_rng())
}

pub fn flight_number_with_rng<R: Rng + ?Sized>(from: &City, to: &City, rng: &mut R) -> String {
    let from_code: String = from.code.chars().take(2).collect();
    let to_code: String = to.code.chars().take(2).collect();
    let suffix: u16 = rng.gen_range(100..1000);
    format!("{FLIGHT_PREFIX}{from_code}{to_code}{suffix}")
}

/// City closest to an arbitrary point, used to preselect the origin
pub fn nearest_city(lat: f64, lng: f64) -> Option<&'static City> {
    all_cities().iter().min_by(|a, b| {
        haversine_km(lat, lng, a.lat, a.lng).total_cmp(&haversine_km(lat, lng, b.lat, b.lng))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn city(name: &str) -> &'static City {
        city_by_name(name).unwrap()
    }

    #[test]
    fn catalog_has_thirty_unique_cities() {
        let cities = all_cities();
        assert_eq!(cities.len(), 30);
        for (i, a) in cities.iter().enumerate() {
            assert_eq!(a.code.len(), 3);
            for b in &cities[i + 1..] {
                assert_ne!(a.id, b.id);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn lookup_by_name_and_id() {
        assert_eq!(city("beijing").id, 1);
        assert_eq!(city("  Xi'an ").code, "XIY");
        assert_eq!(city_by_id(11).unwrap().name, "Tianjin");
        assert!(city_by_name("Atlantis").is_none());
        assert!(city_by_id(999).is_none());
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        for a in all_cities() {
            assert_eq!(distance(a, a), 0);
            for b in all_cities() {
                assert_eq!(distance(a, b), distance(b, a));
            }
        }
    }

    #[test]
    fn short_hop_clamps_to_minimum() {
        let km = distance(city("Beijing"), city("Tianjin"));
        assert!((90..150).contains(&km), "unexpected distance {km}");
        assert_eq!(estimate_duration(km), 15);
    }

    #[test]
    fn beijing_to_xian_takes_seventy_minutes() {
        let km = distance(city("Beijing"), city("Xi'an"));
        assert!((890..=920).contains(&km), "unexpected distance {km}");
        assert_eq!(estimate_duration(km), 70);
    }

    #[test]
    fn estimate_is_always_a_clamped_multiple_of_five() {
        for km in (0..20_000).step_by(7) {
            let m = estimate_duration(km);
            assert!((15..=180).contains(&m), "{km} km -> {m}");
            assert_eq!(m % 5, 0, "{km} km -> {m}");
        }
        assert_eq!(estimate_duration(0), 15);
        assert_eq!(estimate_duration(u32::MAX / 1000), 180);
    }

    #[test]
    fn flight_number_format() {
        let mut rng = StepRng::new(0, 1);
        let n = flight_number_with_rng(city("Beijing"), city("Shanghai"), &mut rng);
        assert!(n.starts_with("FFBJSH"), "{n}");
        let suffix: u16 = n[6..].parse().unwrap();
        assert!((100..1000).contains(&suffix));

        for _ in 0..50 {
            let n = flight_number(city("Harbin"), city("Haikou"));
            assert_eq!(n.len(), 9);
            assert!(n.starts_with("FFHRHA"));
        }
    }

    #[test]
    fn nearest_city_picks_closest_airport() {
        // Just outside central Shanghai
        assert_eq!(nearest_city(31.25, 121.5).unwrap().name, "Shanghai");
        assert_eq!(nearest_city(39.9, 116.4).unwrap().name, "Beijing");
    }
}
