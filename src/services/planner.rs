use std::fmt;

use log::*;

use super::cost::estimate_fuel_cost;
use super::database::TripStorageService;
use super::distance::{DistanceResolver, ResolutionFailure};
use super::geocoding::GeocodingService;
use super::postal_code::PostalCodeService;
use super::routing::RoutingService;
use super::trip::{Expense, ResolvedEndpoints, TransportMode, Trip, TripDraft, UserProfile};
use crate::TripPlannerError;

/// Something the user should be told after a trip was saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanNotice {
    /// Vehicle trip but no profile stored, so no estimate was attempted.
    MissingProfile,
    Resolution(ResolutionFailure),
    /// A distance was found but the profile figures put the cost out of range.
    CostOutOfRange,
}

impl fmt::Display for PlanNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanNotice::MissingProfile => f.write_str("Fill in your vehicle data to estimate fuel cost."),
            PlanNotice::Resolution(failure) => f.write_str(failure.guidance()),
            PlanNotice::CostOutOfRange => {
                f.write_str("Fuel cost could not be estimated; check the fuel economy and price in your vehicle data.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTrip {
    pub trip: Trip,
    pub notice: Option<PlanNotice>,
}

pub struct TripPlanner<G, P, R, S> {
    resolver: DistanceResolver<G, P, R>,
    storage: S,
}

impl<G, P, R, S> TripPlanner<G, P, R, S>
where
    G: GeocodingService,
    P: PostalCodeService,
    R: RoutingService,
    S: TripStorageService,
{
    pub fn new(resolver: DistanceResolver<G, P, R>, storage: S) -> Self {
        TripPlanner { resolver, storage }
    }

    pub fn resolver(&self) -> &DistanceResolver<G, P, R> {
        &self.resolver
    }

    /// Completes a submitted trip and saves it.
    ///
    /// The trip is persisted whatever happens during distance resolution; a
    /// failure only leaves `distance_km` and `fuel_cost` unset. A blank
    /// destination is titled after its postal code when one was given.
    pub async fn plan_trip(&self, mut trip: Trip) -> Result<PlannedTrip, TripPlannerError> {
        if trip.origin.trim().is_empty() {
            return Err(TripPlannerError::MissingField("origin"));
        }
        if trip.route_destination().trim().is_empty() {
            return Err(TripPlannerError::MissingField("destination"));
        }

        trip.refresh_trip_length();
        trip.distance_km = None;
        trip.fuel_cost = None;
        trip.resolved = None;

        let mut notice = None;
        if trip.transport_mode == TransportMode::Vehicle {
            match self.storage.get_profile().await? {
                Some(profile) => notice = self.estimate(&mut trip, &profile).await,
                None => notice = Some(PlanNotice::MissingProfile),
            }
        }

        if trip.destination.trim().is_empty() {
            trip.destination = self
                .destination_title(&trip)
                .await
                .ok_or(TripPlannerError::MissingField("destination"))?;
        }

        let trip = self.storage.save_trip(trip).await?;
        info!("Trip {:?} to {:?} saved.", trip.id, trip.destination);
        Ok(PlannedTrip { trip, notice })
    }

    /// Creates a trip from the submitted fields.
    pub async fn new_trip(&self, draft: TripDraft) -> Result<PlannedTrip, TripPlannerError> {
        self.plan_trip(draft.into_trip()).await
    }

    /// Re-plans a stored trip with the submitted fields laid over it.
    pub async fn edit_trip(&self, trip_id: i64, draft: TripDraft) -> Result<PlannedTrip, TripPlannerError> {
        let mut trip = self.stored_trip(trip_id).await?;
        draft.apply_to(&mut trip);
        self.plan_trip(trip).await
    }

    async fn estimate(&self, trip: &mut Trip, profile: &UserProfile) -> Option<PlanNotice> {
        let result = self
            .resolver
            .resolve_distance(&trip.origin, trip.route_destination())
            .await;

        if let (Some(origin), Some(destination)) = (result.origin_resolved, result.destination_resolved) {
            trip.resolved = Some(ResolvedEndpoints { origin, destination });
        }
        if let Some(failure) = result.failure {
            return Some(PlanNotice::Resolution(failure));
        }

        let kilometers = result.kilometers?;
        trip.distance_km = Some(kilometers);
        trip.fuel_cost = estimate_fuel_cost(
            kilometers,
            Some(profile.fuel_economy_km_per_liter),
            profile.fuel_price_per_liter,
        );
        if trip.fuel_cost.is_none() {
            warn!(
                "Fuel cost for {:.1} km at {} km/l and {} per liter is out of range.",
                kilometers, profile.fuel_economy_km_per_liter, profile.fuel_price_per_liter
            );
            return Some(PlanNotice::CostOutOfRange);
        }
        None
    }

    /// "neighborhood, city, region" of the destination postal code.
    async fn destination_title(&self, trip: &Trip) -> Option<String> {
        let address = match &trip.resolved {
            Some(resolved) => resolved.destination.clone(),
            None => self.resolver.lookup_postal_code(trip.route_destination()).await?,
        };
        Some(address.locality()).filter(|title| !title.is_empty())
    }

    async fn stored_trip(&self, trip_id: i64) -> Result<Trip, TripPlannerError> {
        self.storage
            .get_trip(trip_id)
            .await?
            .ok_or(TripPlannerError::TripNotFound(trip_id))
    }

    pub async fn get_trip(&self, trip_id: i64) -> Result<Option<Trip>, TripPlannerError> {
        self.storage.get_trip(trip_id).await
    }

    /// Replaces the expenses of a stored trip.
    pub async fn record_expenses(&self, trip_id: i64, items: Vec<Expense>) -> Result<Trip, TripPlannerError> {
        let mut trip = self.stored_trip(trip_id).await?;
        trip.expenses = items;
        self.storage.save_trip(trip).await
    }

    pub async fn set_completed(&self, trip_id: i64, completed: bool) -> Result<Trip, TripPlannerError> {
        let mut trip = self.stored_trip(trip_id).await?;
        trip.completed = Some(completed);
        self.storage.save_trip(trip).await
    }

    pub async fn search_trips(&self, filter: &str) -> Result<Vec<Trip>, TripPlannerError> {
        let trips = self.storage.list_trips().await?;
        Ok(trips.into_iter().filter(|trip| trip.matches(filter)).collect())
    }

    pub async fn delete_trip(&self, trip_id: i64) -> Result<(), TripPlannerError> {
        self.storage.delete_trip(trip_id).await
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), TripPlannerError> {
        self.storage.save_profile(profile).await
    }

    /// Stored profile, or the suggested defaults when none was saved yet.
    pub async fn profile_or_default(&self) -> Result<UserProfile, TripPlannerError> {
        Ok(self.storage.get_profile().await?.unwrap_or_default())
    }
}
