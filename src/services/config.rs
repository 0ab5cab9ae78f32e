//! Endpoints, locale hints and storage location, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::TripPlannerError;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_POSTAL_URL: &str = "https://viacep.com.br";
pub const DEFAULT_ROUTER_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub geocoder_url: String,
    pub postal_url: String,
    pub router_url: String,
    /// Country filter sent to the place-search service.
    pub country_codes: String,
    /// `Accept-Language` hint sent to the place-search service.
    pub language: String,
    pub user_agent: String,
    /// Applied to every outgoing request.
    pub timeout: Duration,
    pub data_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            postal_url: DEFAULT_POSTAL_URL.to_string(),
            router_url: DEFAULT_ROUTER_URL.to_string(),
            country_codes: "br".to_string(),
            language: "pt-BR".to_string(),
            user_agent: format!("trip-planner/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            data_dir: PathBuf::from(".trip-planner"),
        }
    }
}

impl ServiceConfig {
    /// Reads `TRIP_PLANNER_*` variables (a `.env` file is honoured), keeping
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, TripPlannerError> {
        let defaults = ServiceConfig::default();
        let var = |name: &str| dotenv::var(name).ok().filter(|v| !v.trim().is_empty());

        let timeout = match var("TRIP_PLANNER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    TripPlannerError::Config(format!("TRIP_PLANNER_TIMEOUT_SECS={raw:?} is not a number of seconds"))
                })?,
            None => defaults.timeout,
        };

        let config = ServiceConfig {
            geocoder_url: var("TRIP_PLANNER_GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            postal_url: var("TRIP_PLANNER_POSTAL_URL").unwrap_or(defaults.postal_url),
            router_url: var("TRIP_PLANNER_ROUTER_URL").unwrap_or(defaults.router_url),
            country_codes: var("TRIP_PLANNER_COUNTRY_CODES").unwrap_or(defaults.country_codes),
            language: var("TRIP_PLANNER_LANGUAGE").unwrap_or(defaults.language),
            user_agent: var("TRIP_PLANNER_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout,
            data_dir: var("TRIP_PLANNER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TripPlannerError> {
        for (name, url) in [
            ("geocoder", &self.geocoder_url),
            ("postal", &self.postal_url),
            ("router", &self.router_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripPlannerError::Config(format!(
                    "{name} url must start with http:// or https://, got {url:?}"
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(TripPlannerError::Config("timeout cannot be zero".to_string()));
        }
        Ok(())
    }

    /// Shared HTTP client for all three services.
    pub fn http_client(&self) -> Result<reqwest::Client, TripPlannerError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()?;
        Ok(client)
    }
}

pub(crate) fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}
