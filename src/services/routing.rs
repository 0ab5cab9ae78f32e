use super::config::{trim_base, ServiceConfig};
use super::{GeoPoint, ServiceError};

use async_trait::async_trait;
use log::*;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Total driving distance between two points, in kilometers.
    async fn route_distance(&self, from: &GeoPoint, to: &GeoPoint) -> Result<f64, ServiceError>;
}

/// Driving-directions client speaking the OSRM `/route/v1/driving` protocol.
pub struct OsrmService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
}

pub fn parse_route_response(body: &str) -> Result<f64, ServiceError> {
    let response: OsrmResponse = serde_json::from_str(body)?;
    if response.code != "Ok" {
        return Err(ServiceError::RouteStatus(response.code));
    }
    let route = response.routes.first().ok_or(ServiceError::NotFound)?;
    Ok(route.distance / 1000.0)
}

/// OSRM reports NoRoute and friends with a 400 and a JSON body; its code wins
/// over the bare status when the body parses.
pub fn route_outcome(status: StatusCode, body: &str) -> Result<f64, ServiceError> {
    match parse_route_response(body) {
        Err(ServiceError::Json(_)) if !status.is_success() => Err(ServiceError::Status(status.as_u16())),
        Ok(_) if !status.is_success() => Err(ServiceError::Status(status.as_u16())),
        result => result,
    }
}

impl OsrmService {
    pub fn new(config: &ServiceConfig, client: reqwest::Client) -> Self {
        OsrmService {
            client,
            base_url: trim_base(&config.router_url).to_string(),
        }
    }

    pub fn route_request(&self, from: &GeoPoint, to: &GeoPoint) -> RequestBuilder {
        // OSRM takes longitude first.
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, from.longitude, from.latitude, to.longitude, to.latitude
        );
        self.client.get(url).query(&[("overview", "false")])
    }
}

#[async_trait]
impl RoutingService for OsrmService {
    async fn route_distance(&self, from: &GeoPoint, to: &GeoPoint) -> Result<f64, ServiceError> {
        trace!(
            "Requesting route ({}, {}) -> ({}, {}).",
            from.latitude,
            from.longitude,
            to.latitude,
            to.longitude
        );
        let response = self.route_request(from, to).send().await?;
        let status = response.status();
        let body = response.text().await?;
        route_outcome(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{campinas, sao_paulo};

    #[test]
    fn route_request_puts_longitude_first() {
        let service = OsrmService::new(&ServiceConfig::default(), reqwest::Client::new());
        let request = service.route_request(&campinas(), &sao_paulo()).build().unwrap();

        assert_eq!(request.url().host_str(), Some("router.project-osrm.org"));
        assert_eq!(
            request.url().path(),
            "/route/v1/driving/-47.0608,-22.9056;-46.6333,-23.5506"
        );
        assert_eq!(request.url().query(), Some("overview=false"));
    }

    #[test]
    fn no_route_answer_keeps_its_code() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        match route_outcome(StatusCode::BAD_REQUEST, body) {
            Err(ServiceError::RouteStatus(code)) => assert_eq!(code, "NoRoute"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_status_without_route_body_is_a_status_failure() {
        assert!(matches!(
            route_outcome(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            Err(ServiceError::Status(502))
        ));
        let ok_body = r#"{"code": "Ok", "routes": [{"distance": 1000}]}"#;
        assert!(matches!(
            route_outcome(StatusCode::INTERNAL_SERVER_ERROR, ok_body),
            Err(ServiceError::Status(500))
        ));
        assert_eq!(route_outcome(StatusCode::OK, ok_body).unwrap(), 1.0);
    }

    #[test]
    fn converts_meters_without_rounding() {
        let body = r#"{"code": "Ok", "routes": [{"distance": 95123, "duration": 4100.2}], "waypoints": []}"#;
        assert_eq!(parse_route_response(body).unwrap(), 95.123);
    }

    #[test]
    fn only_first_route_counts() {
        let body = r#"{"code": "Ok", "routes": [{"distance": 1000}, {"distance": 500}]}"#;
        assert_eq!(parse_route_response(body).unwrap(), 1.0);
    }

    #[test]
    fn non_ok_code_is_a_failure() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        match parse_route_response(body) {
            Err(ServiceError::RouteStatus(code)) => assert_eq!(code, "NoRoute"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_route_list_is_a_failure() {
        assert!(matches!(
            parse_route_response(r#"{"code": "Ok", "routes": []}"#),
            Err(ServiceError::NotFound)
        ));
    }
}
