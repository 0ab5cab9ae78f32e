//! Turns two free-text locations into a road distance.
//!
//! Postal codes are expanded through the postal directory, both endpoints are
//! geocoded (with one narrowing retry each) and the router measures the road
//! between them. Address resolution is a hard requirement: if either endpoint
//! cannot be placed the whole call yields nothing. Routing is not: when it
//! fails the resolved addresses are still returned, without a distance.

use derive_more::Display;
use log::*;
use serde::Serialize;

use super::geocoding::GeocodingService;
use super::postal_code::{is_postal_code, PostalCodeService};
use super::routing::RoutingService;
use super::{Endpoint, GeoPoint, ResolvedAddress};

/// Why a resolution produced less than a full result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum ResolutionFailure {
    #[display(fmt = "postal code for {} could not be resolved", _0)]
    UnresolvablePostalCode(Endpoint),
    #[display(fmt = "{} could not be geocoded", _0)]
    UnresolvableAddress(Endpoint),
    #[display(fmt = "no road route between the endpoints")]
    RouteUnavailable,
}

impl ResolutionFailure {
    /// Guidance shown to the user for this failure.
    pub fn guidance(&self) -> &'static str {
        match self {
            ResolutionFailure::UnresolvablePostalCode(_) | ResolutionFailure::UnresolvableAddress(_) => {
                "Could not locate origin/destination. Try entering only the city."
            }
            ResolutionFailure::RouteUnavailable => {
                "Could not compute a road route; check the address/postal code and try again."
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistanceResult {
    pub kilometers: Option<f64>,
    pub origin_resolved: Option<ResolvedAddress>,
    pub destination_resolved: Option<ResolvedAddress>,
    pub failure: Option<ResolutionFailure>,
}

impl DistanceResult {
    fn failed(failure: ResolutionFailure) -> Self {
        DistanceResult {
            failure: Some(failure),
            ..Default::default()
        }
    }
}

/// Last two comma-separated segments of a query, approximating "city, region".
pub fn narrow_query(query: &str) -> Option<String> {
    if !query.contains(',') {
        return None;
    }
    let parts: Vec<&str> = query.split(',').collect();
    let start = parts.len().saturating_sub(2);
    Some(parts[start..].join(","))
}

/// Query text for one endpoint after postal-code expansion.
struct EndpointQuery {
    text: String,
    resolved: Option<ResolvedAddress>,
}

pub struct DistanceResolver<G, P, R> {
    geocoder: G,
    postal_codes: P,
    router: R,
}

impl<G, P, R> DistanceResolver<G, P, R>
where
    G: GeocodingService,
    P: PostalCodeService,
    R: RoutingService,
{
    pub fn new(geocoder: G, postal_codes: P, router: R) -> Self {
        DistanceResolver {
            geocoder,
            postal_codes,
            router,
        }
    }

    pub async fn resolve_distance(&self, origin: &str, destination: &str) -> DistanceResult {
        let origin_query = match self.expand_postal_code(Endpoint::Origin, origin).await {
            Some(query) => query,
            None => return DistanceResult::failed(ResolutionFailure::UnresolvablePostalCode(Endpoint::Origin)),
        };
        let destination_query = match self.expand_postal_code(Endpoint::Destination, destination).await {
            Some(query) => query,
            None => {
                return DistanceResult::failed(ResolutionFailure::UnresolvablePostalCode(Endpoint::Destination))
            }
        };

        let mut origin_point = self.geocode(Endpoint::Origin, &origin_query.text).await;
        let mut destination_point = self.geocode(Endpoint::Destination, &destination_query.text).await;
        if origin_point.is_none() {
            origin_point = self.geocode_narrowed(Endpoint::Origin, &origin_query.text).await;
        }
        if destination_point.is_none() {
            destination_point = self.geocode_narrowed(Endpoint::Destination, &destination_query.text).await;
        }

        let (origin_point, destination_point) = match (origin_point, destination_point) {
            (Some(origin), Some(destination)) => (origin, destination),
            (None, _) => return DistanceResult::failed(ResolutionFailure::UnresolvableAddress(Endpoint::Origin)),
            (_, None) => {
                return DistanceResult::failed(ResolutionFailure::UnresolvableAddress(Endpoint::Destination))
            }
        };

        let origin_resolved = origin_query
            .resolved
            .unwrap_or_else(|| ResolvedAddress::from_geo_point(&origin_point));
        let destination_resolved = destination_query
            .resolved
            .unwrap_or_else(|| ResolvedAddress::from_geo_point(&destination_point));

        let kilometers = match self.router.route_distance(&origin_point, &destination_point).await {
            Ok(kilometers) => {
                info!("Road distance {:?} → {:?}: {:.1} km.", origin, destination, kilometers);
                Some(kilometers)
            }
            Err(err) => {
                warn!("Routing {:?} → {:?} failed: {}", origin, destination, err);
                None
            }
        };

        DistanceResult {
            kilometers,
            origin_resolved: Some(origin_resolved),
            destination_resolved: Some(destination_resolved),
            failure: kilometers.is_none().then_some(ResolutionFailure::RouteUnavailable),
        }
    }

    /// Looks a postal code up on its own, outside of a distance resolution.
    pub async fn lookup_postal_code(&self, code: &str) -> Option<ResolvedAddress> {
        match self.postal_codes.resolve_postal_code(code).await {
            Ok(address) => Some(address),
            Err(err) => {
                warn!("Postal code {:?} could not be resolved: {}", code, err);
                None
            }
        }
    }

    /// `None` means the input looked like a postal code but the directory could not explain it.
    async fn expand_postal_code(&self, endpoint: Endpoint, query: &str) -> Option<EndpointQuery> {
        if !is_postal_code(query) {
            return Some(EndpointQuery {
                text: query.to_string(),
                resolved: None,
            });
        }
        match self.postal_codes.resolve_postal_code(query).await {
            Ok(address) => {
                debug!("Postal code {:?} ({}) is {:?}.", query, endpoint, address.full_text);
                Some(EndpointQuery {
                    text: address.full_text.clone(),
                    resolved: Some(address),
                })
            }
            Err(err) => {
                warn!("Postal code {:?} ({}) could not be resolved: {}", query, endpoint, err);
                None
            }
        }
    }

    async fn geocode(&self, endpoint: Endpoint, query: &str) -> Option<GeoPoint> {
        match self.geocoder.geocode(query).await {
            Ok(point) => Some(point),
            Err(err) => {
                warn!("Geocoding {} {:?} failed: {}", endpoint, query, err);
                None
            }
        }
    }

    async fn geocode_narrowed(&self, endpoint: Endpoint, query: &str) -> Option<GeoPoint> {
        let narrowed = narrow_query(query)?;
        debug!("Retrying {} with {:?}.", endpoint, narrowed);
        self.geocode(endpoint, &narrowed).await
    }
}
