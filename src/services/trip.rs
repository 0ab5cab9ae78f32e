use chrono::NaiveDate;
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ResolvedAddress;
use crate::TripPlannerError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Own car: distance and fuel cost are estimated.
    #[default]
    #[display(fmt = "vehicle")]
    Vehicle,
    #[display(fmt = "ticket")]
    Ticket,
}

/// An ad-hoc cost of a trip. Built through [`Expense::new`], which refuses negative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    name: String,
    value: Decimal,
}

impl Expense {
    pub fn new(name: impl Into<String>, value: Decimal) -> Result<Self, TripPlannerError> {
        let name = name.into();
        if value.is_sign_negative() && !value.is_zero() {
            return Err(TripPlannerError::NegativeExpense { name });
        }
        Ok(Expense { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Decimal {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEndpoints {
    pub origin: ResolvedAddress,
    pub destination: ResolvedAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trip {
    /// Assigned on first save when absent.
    pub id: Option<i64>,
    pub destination: String,
    pub origin: String,
    pub photo_url: String,
    pub transport_mode: TransportMode,
    pub destination_postal_code: Option<String>,
    pub expenses: Vec<Expense>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub trip_length_days: Option<i64>,
    pub distance_km: Option<f64>,
    pub fuel_cost: Option<Decimal>,
    pub resolved: Option<ResolvedEndpoints>,
    pub completed: Option<bool>,
}

/// Trip fields as submitted by the user. Absent fields keep the stored value
/// when editing and the [`Trip`] default when creating.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripDraft {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub destination_postal_code: Option<String>,
    pub transport_mode: Option<TransportMode>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub expenses: Option<Vec<Expense>>,
}

impl TripDraft {
    pub fn apply_to(self, trip: &mut Trip) {
        if let Some(origin) = self.origin {
            trip.origin = origin;
        }
        if let Some(destination) = self.destination {
            trip.destination = destination;
        }
        if let Some(code) = self.destination_postal_code {
            trip.destination_postal_code = Some(code);
        }
        if let Some(mode) = self.transport_mode {
            trip.transport_mode = mode;
        }
        if let Some(date) = self.departure_date {
            trip.departure_date = Some(date);
        }
        if let Some(date) = self.return_date {
            trip.return_date = Some(date);
        }
        if let Some(photo_url) = self.photo_url {
            trip.photo_url = photo_url;
        }
        if let Some(expenses) = self.expenses {
            trip.expenses = expenses;
        }
    }

    pub fn into_trip(self) -> Trip {
        let mut trip = Trip::default();
        self.apply_to(&mut trip);
        trip
    }
}

/// Inclusive day count; absent unless both dates exist and return is not before departure.
pub fn trip_length_days(departure: Option<NaiveDate>, return_date: Option<NaiveDate>) -> Option<i64> {
    let days = (return_date? - departure?).num_days();
    (days >= 0).then_some(days + 1)
}

impl Trip {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, transport_mode: TransportMode) -> Self {
        Trip {
            origin: origin.into(),
            destination: destination.into(),
            transport_mode,
            ..Default::default()
        }
    }

    pub fn refresh_trip_length(&mut self) {
        self.trip_length_days = trip_length_days(self.departure_date, self.return_date);
    }

    pub fn expenses_total(&self) -> Decimal {
        self.expenses.iter().map(|expense| expense.value).sum()
    }

    /// Ad-hoc expenses plus the fuel estimate, if any.
    pub fn estimated_total(&self) -> Decimal {
        self.expenses_total() + self.fuel_cost.unwrap_or_default()
    }

    /// Where the route should end: the destination postal code when one was given.
    pub fn route_destination(&self) -> &str {
        self.destination_postal_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(&self.destination)
    }

    /// Case-insensitive substring match on destination or origin.
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.to_lowercase();
        self.destination.to_lowercase().contains(&filter) || self.origin.to_lowercase().contains(&filter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub fuel_economy_km_per_liter: f64,
    pub fuel_price_per_liter: Decimal,
    #[serde(default)]
    pub tank_capacity_liters: Option<f64>,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            fuel_economy_km_per_liter: 10.0,
            fuel_price_per_liter: Decimal::new(550, 2),
            tank_capacity_liters: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn trip_length_is_inclusive() {
        assert_eq!(trip_length_days(date(2024, 7, 1), date(2024, 7, 5)), Some(5));
        assert_eq!(trip_length_days(date(2024, 7, 1), date(2024, 7, 1)), Some(1));
        assert_eq!(trip_length_days(date(2024, 12, 30), date(2025, 1, 2)), Some(4));
    }

    #[test]
    fn trip_length_needs_ordered_dates() {
        assert_eq!(trip_length_days(date(2024, 7, 5), date(2024, 7, 1)), None);
        assert_eq!(trip_length_days(None, date(2024, 7, 1)), None);
        assert_eq!(trip_length_days(date(2024, 7, 1), None), None);
    }

    #[test]
    fn negative_expenses_are_rejected() {
        assert!(matches!(
            Expense::new("Hotel", Decimal::new(-1, 2)),
            Err(TripPlannerError::NegativeExpense { name }) if name == "Hotel"
        ));
        let parking = Expense::new("Parking", Decimal::ZERO).unwrap();
        assert_eq!(parking.name(), "Parking");
        assert!(parking.value().is_zero());
    }

    #[test]
    fn draft_overlays_only_given_fields() {
        let mut trip = Trip::new("Campinas", "Santos", TransportMode::Vehicle);
        trip.photo_url = "https://example.org/santos.jpg".into();
        trip.expenses = vec![Expense::new("Hotel", Decimal::new(35000, 2)).unwrap()];
        trip.completed = Some(true);
        trip.departure_date = date(2024, 1, 10);

        TripDraft {
            destination: Some("Guarujá".into()),
            return_date: date(2024, 1, 12),
            ..Default::default()
        }
        .apply_to(&mut trip);

        assert_eq!(trip.origin, "Campinas");
        assert_eq!(trip.destination, "Guarujá");
        assert_eq!(trip.photo_url, "https://example.org/santos.jpg");
        assert_eq!(trip.expenses.len(), 1);
        assert_eq!(trip.completed, Some(true));
        assert_eq!(trip.departure_date, date(2024, 1, 10));
        assert_eq!(trip.return_date, date(2024, 1, 12));
    }

    #[test]
    fn new_draft_defaults_to_vehicle() {
        let trip = TripDraft {
            origin: Some("Recife".into()),
            destination: Some("Olinda".into()),
            ..Default::default()
        }
        .into_trip();
        assert_eq!(trip, Trip::new("Recife", "Olinda", TransportMode::Vehicle));
    }

    #[test]
    fn totals_include_fuel() {
        let mut trip = Trip::new("Campinas", "Santos", TransportMode::Vehicle);
        trip.expenses = vec![
            Expense::new("Hotel", Decimal::new(35000, 2)).unwrap(),
            Expense::new("Tolls", Decimal::new(4780, 2)).unwrap(),
        ];
        assert_eq!(trip.expenses_total(), Decimal::new(39780, 2));
        assert_eq!(trip.estimated_total(), Decimal::new(39780, 2));

        trip.fuel_cost = Some(Decimal::new(8020, 2));
        assert_eq!(trip.estimated_total(), Decimal::new(47800, 2));
    }

    #[test]
    fn route_prefers_destination_postal_code() {
        let mut trip = Trip::new("Campinas", "Praia", TransportMode::Vehicle);
        assert_eq!(trip.route_destination(), "Praia");
        trip.destination_postal_code = Some("  ".into());
        assert_eq!(trip.route_destination(), "Praia");
        trip.destination_postal_code = Some("11060-001".into());
        assert_eq!(trip.route_destination(), "11060-001");
    }

    #[test]
    fn filter_matches_either_end() {
        let trip = Trip::new("Belo Horizonte", "Ouro Preto", TransportMode::Ticket);
        assert!(trip.matches("ouro"));
        assert!(trip.matches("HORIZONTE"));
        assert!(trip.matches(""));
        assert!(!trip.matches("Recife"));
    }

    #[test]
    fn stored_shape_uses_camel_case() {
        let mut trip = Trip::new("A", "B", TransportMode::Ticket);
        trip.id = Some(7);
        trip.departure_date = date(2024, 3, 9);
        let json = serde_json::to_value(&trip).unwrap();
        assert_eq!(json["transportMode"], "ticket");
        assert_eq!(json["departureDate"], "2024-03-09");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn nested_resolved_addresses_use_camel_case() {
        let address = ResolvedAddress {
            postal_code: Some("01310100".into()),
            full_text: "Avenida Paulista, Bela Vista, São Paulo, SP".into(),
            ..Default::default()
        };
        let mut trip = Trip::new("A", "B", TransportMode::Vehicle);
        trip.resolved = Some(ResolvedEndpoints {
            origin: address.clone(),
            destination: address,
        });
        let json = serde_json::to_value(&trip).unwrap();
        let origin = &json["resolved"]["origin"];
        assert_eq!(origin["postalCode"], "01310100");
        assert_eq!(origin["fullText"], "Avenida Paulista, Bela Vista, São Paulo, SP");
        assert!(origin.get("postal_code").is_none());
    }
}
