use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod cost;
pub mod database;
pub mod distance;
pub mod geocoding;
pub mod planner;
pub mod postal_code;
pub mod routing;
pub mod trip;

#[cfg(test)]
pub(crate) mod testing;

/// Failure of a single call to an external service.
///
/// Never crosses the distance engine boundary: the engine logs it and turns
/// it into an absent value.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service answered with HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no result")]
    NotFound,
    #[error("{0:?} is not an 8-digit postal code")]
    InvalidPostalCode(String),
    #[error("coordinate {0:?} is not a number")]
    UnparseableCoordinate(String),
    #[error("coordinates ({lat}, {lon}) are out of range")]
    InvalidCoordinates { lat: f64, lon: f64 },
    #[error("router answered with status {0:?}")]
    RouteStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    #[display(fmt = "origin")]
    Origin,
    #[display(fmt = "destination")]
    Destination,
}

/// Structured address fields as reported by the place-search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressComponents {
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub quarter: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub raw_address: AddressComponents,
    pub display_name: String,
}

impl GeoPoint {
    pub fn new(
        latitude: f64,
        longitude: f64,
        raw_address: AddressComponents,
        display_name: String,
    ) -> Result<Self, ServiceError> {
        let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !in_range {
            return Err(ServiceError::InvalidCoordinates {
                lat: latitude,
                lon: longitude,
            });
        }
        Ok(GeoPoint {
            latitude,
            longitude,
            raw_address,
            display_name,
        })
    }
}

/// Display-ready summary of where an endpoint was resolved to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAddress {
    pub postal_code: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub full_text: String,
}

/// A single field of [`AddressComponents`], used to build prioritized lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Neighbourhood,
    Suburb,
    Village,
    Hamlet,
    Quarter,
    City,
    Town,
    County,
    State,
    Region,
    Postcode,
}

impl AddressField {
    fn get(self, address: &AddressComponents) -> Option<&str> {
        let value = match self {
            AddressField::Neighbourhood => &address.neighbourhood,
            AddressField::Suburb => &address.suburb,
            AddressField::Village => &address.village,
            AddressField::Hamlet => &address.hamlet,
            AddressField::Quarter => &address.quarter,
            AddressField::City => &address.city,
            AddressField::Town => &address.town,
            AddressField::County => &address.county,
            AddressField::State => &address.state,
            AddressField::Region => &address.region,
            AddressField::Postcode => &address.postcode,
        };
        value.as_deref()
    }
}

// First non-empty field wins; sub-locality fields are listed before coarser ones.
pub const NEIGHBORHOOD_FIELDS: &[AddressField] = &[
    AddressField::Neighbourhood,
    AddressField::Suburb,
    AddressField::Village,
    AddressField::Hamlet,
    AddressField::Quarter,
];
pub const CITY_FIELDS: &[AddressField] = &[
    AddressField::City,
    AddressField::Town,
    AddressField::Village,
    AddressField::County,
];
pub const REGION_FIELDS: &[AddressField] = &[AddressField::State, AddressField::Region];
pub const POSTAL_CODE_FIELDS: &[AddressField] = &[AddressField::Postcode];

pub fn first_present(address: &AddressComponents, fields: &[AddressField]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| field.get(address))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResolvedAddress {
    pub fn from_geo_point(point: &GeoPoint) -> Self {
        let address = &point.raw_address;
        let neighborhood = first_present(address, NEIGHBORHOOD_FIELDS).unwrap_or_default();
        let city = first_present(address, CITY_FIELDS).unwrap_or_default();
        let region = first_present(address, REGION_FIELDS).unwrap_or_default();
        let postal_code = first_present(address, POSTAL_CODE_FIELDS);

        let mut full_text = join_non_empty([neighborhood.as_str(), city.as_str(), region.as_str()]);
        if full_text.is_empty() {
            full_text = point.display_name.clone();
        }

        ResolvedAddress {
            postal_code,
            neighborhood,
            city,
            region,
            full_text,
        }
    }

    /// "neighborhood, city, region" with empty parts skipped; used as a trip title.
    pub fn locality(&self) -> String {
        join_non_empty([self.neighborhood.as_str(), self.city.as_str(), self.region.as_str()])
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(postal_code) = self.postal_code.as_deref().filter(|p| !p.is_empty()) {
            write!(f, "{} — ", postal_code)?;
        }
        if !self.neighborhood.is_empty() {
            write!(f, "{}, ", self.neighborhood)?;
        }
        if !self.city.is_empty() {
            write!(f, "{} - ", self.city)?;
        }
        write!(f, "{}", self.region)
    }
}
