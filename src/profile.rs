use chrono::{DateTime, FixedOffset};
use log::{error, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FlightError;
use crate::geo::FLIGHT_PREFIX;
use crate::stats::local_day;
use crate::store::{get_json, keys, set_json, KeyValueStore};
use crate::util::relative_day_text;

/// Locally stored identity. Unknown fields from older versions are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    pub fn pilot_id(&self) -> &str {
        self.open_id.as_deref().unwrap_or("")
    }

    /// When the pilot last signed in, relative to `now`
    pub fn login_text(&self, now: DateTime<FixedOffset>) -> Option<String> {
        let login = DateTime::parse_from_rfc3339(self.login_time.as_deref()?).ok()?;
        let tz = now.offset();
        let day = local_day(login.timestamp_millis(), tz)?;
        let today = now.date_naive();

        if day == today {
            Some(format!("Today {}", login.with_timezone(tz).format("%H:%M")))
        } else {
            Some(relative_day_text(day, today))
        }
    }
}

/// "FF" followed by six random digits
pub fn generate_pilot_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{FLIGHT_PREFIX}{}", rng.gen_range(100_000..1_000_000))
}

/// Read the stored user info, minting a pilot id on first use.
///
/// A failure to save the new id is logged and the id is still returned, so
/// the profile screen always has something to show.
pub fn load_or_create<S, R>(store: &S, rng: &mut R) -> Result<UserInfo, FlightError>
where
    S: KeyValueStore + ?Sized,
    R: Rng + ?Sized,
{
    let mut user: UserInfo = get_json(store, keys::USER_INFO)
        .inspect_err(|e| error!("failed to load user info: {e}"))?
        .unwrap_or_default();

    if user.open_id.as_deref().map_or(true, str::is_empty) {
        let id = generate_pilot_id(rng);
        info!("assigned pilot id {id}");
        user.open_id = Some(id);
        if let Err(e) = set_json(store, keys::USER_INFO, &user) {
            error!("failed to save user info: {e}");
        }
    }

    Ok(user)
}
