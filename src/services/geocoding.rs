use super::config::{trim_base, ServiceConfig};
use super::{AddressComponents, GeoPoint, ServiceError};

use async_trait::async_trait;
use log::*;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Resolves free text to the single best-matching place.
    async fn geocode(&self, query: &str) -> Result<GeoPoint, ServiceError>;
}

/// Place-search client speaking the Nominatim `/search` protocol.
pub struct NominatimService {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
    language: String,
}

/// One candidate of a Nominatim `format=json` answer. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub address: AddressComponents,
}

impl TryFrom<NominatimPlace> for GeoPoint {
    type Error = ServiceError;

    fn try_from(place: NominatimPlace) -> Result<Self, Self::Error> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| ServiceError::UnparseableCoordinate(raw.to_string()))
        };
        let latitude = parse(&place.lat)?;
        let longitude = parse(&place.lon)?;
        GeoPoint::new(latitude, longitude, place.address, place.display_name)
    }
}

/// Takes the top candidate of a search answer.
pub fn parse_search_response(body: &str) -> Result<GeoPoint, ServiceError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)?;
    let place = places.into_iter().next().ok_or(ServiceError::NotFound)?;
    GeoPoint::try_from(place)
}

/// Any non-2xx answer is a failure, whatever its body says.
pub fn search_outcome(status: StatusCode, body: &str) -> Result<GeoPoint, ServiceError> {
    if !status.is_success() {
        return Err(ServiceError::Status(status.as_u16()));
    }
    parse_search_response(body)
}

impl NominatimService {
    pub fn new(config: &ServiceConfig, client: reqwest::Client) -> Self {
        NominatimService {
            client,
            base_url: trim_base(&config.geocoder_url).to_string(),
            country_codes: config.country_codes.clone(),
            language: config.language.clone(),
        }
    }

    /// Top candidate only, with address details, restricted to the configured countries.
    pub fn search_request(&self, query: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
                ("countrycodes", self.country_codes.as_str()),
            ])
            .header(reqwest::header::ACCEPT_LANGUAGE, self.language.as_str())
    }
}

#[async_trait]
impl GeocodingService for NominatimService {
    async fn geocode(&self, query: &str) -> Result<GeoPoint, ServiceError> {
        trace!("Geocoding {:?}.", query);
        let response = self.search_request(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let point = search_outcome(status, &body)?;
        trace!(
            "Received coordinates ({}, {}) for {:?}.",
            point.latitude,
            point.longitude,
            query
        );
        Ok(point)
    }
}
