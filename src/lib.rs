//! Single-user trip-cost planner.
//!
//! Records trips, resolves road distance between two free-text locations
//! (addresses or 8-digit postal codes) and estimates fuel cost for car trips.
//! Everything is persisted in a local key-value store.

use thiserror::Error;

pub mod services;

pub use services::config::ServiceConfig;
pub use services::cost::estimate_fuel_cost;
pub use services::database::{FileStore, KeyValueStore, MemoryStore, TripRepository, TripStorageService};
pub use services::distance::{DistanceResolver, DistanceResult, ResolutionFailure};
pub use services::planner::{PlanNotice, PlannedTrip, TripPlanner};
pub use services::postal_code::is_postal_code;
pub use services::trip::{Expense, TransportMode, Trip, TripDraft, UserProfile};

pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TripPlannerError {
    #[error("Trip {0} not found.")]
    TripNotFound(i64),
    #[error("Expense {name:?} has a negative value.")]
    NegativeExpense { name: String },
    #[error("Trip {0} is required.")]
    MissingField(&'static str),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Could not serialize stored data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("HTTP client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}
