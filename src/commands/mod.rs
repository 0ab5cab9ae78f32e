use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use log::*;
use rust_decimal::Decimal;

use trip_planner::services::database::{FileStore, TripRepository};
use trip_planner::services::distance::DistanceResolver;
use trip_planner::services::geocoding::NominatimService;
use trip_planner::services::postal_code::ViaCepService;
use trip_planner::services::routing::OsrmService;
use trip_planner::{
    estimate_fuel_cost, Expense, GenericError, ServiceConfig, TransportMode, Trip, TripDraft, TripPlanner,
    TripPlannerError, UserProfile,
};

pub type AppPlanner = TripPlanner<NominatimService, ViaCepService, OsrmService, TripRepository<FileStore>>;

pub fn build_planner(config: &ServiceConfig) -> Result<AppPlanner, TripPlannerError> {
    let client = config.http_client()?;
    let resolver = DistanceResolver::new(
        NominatimService::new(config, client.clone()),
        ViaCepService::new(config, client.clone()),
        OsrmService::new(config, client),
    );
    let storage = TripRepository::new(FileStore::new(config.data_dir.clone()));
    Ok(TripPlanner::new(resolver, storage))
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the road distance between two places or postal codes.
    Distance { origin: String, destination: String },
    /// Record a trip, estimating distance and fuel cost for car trips.
    Plan(PlanArgs),
    /// List saved trips, optionally filtered by origin or destination.
    List { filter: Option<String> },
    /// Replace the expenses of a saved trip.
    Expenses {
        id: i64,
        #[arg(long = "expense", value_parser = parse_expense)]
        expenses: Vec<Expense>,
    },
    /// Mark a trip as done (or not done, with --undo).
    Complete {
        id: i64,
        #[arg(long)]
        undo: bool,
    },
    /// Delete a saved trip.
    Delete { id: i64 },
    /// Show the vehicle profile, or update it when values are given.
    Profile(ProfileArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Mode {
    Vehicle,
    Ticket,
}

impl From<Mode> for TransportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Vehicle => TransportMode::Vehicle,
            Mode::Ticket => TransportMode::Ticket,
        }
    }
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Update the trip with this id instead of creating a new one; omitted values keep their stored value.
    #[arg(long)]
    id: Option<i64>,
    #[arg(short, long)]
    origin: Option<String>,
    /// May be left out when a destination postal code is given.
    #[arg(short, long)]
    destination: Option<String>,
    /// Postal code of the destination; preferred over the destination text for routing.
    #[arg(long)]
    destination_postal_code: Option<String>,
    /// Defaults to vehicle for new trips.
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    #[arg(long)]
    departure: Option<NaiveDate>,
    #[arg(long = "return")]
    return_date: Option<NaiveDate>,
    #[arg(long)]
    photo_url: Option<String>,
    /// Repeatable, as NAME=VALUE (e.g. --expense Hotel=350.00).
    #[arg(long = "expense", value_parser = parse_expense)]
    expenses: Vec<Expense>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Kilometers per liter.
    #[arg(long, value_parser = parse_economy)]
    economy: Option<f64>,
    /// Price per liter.
    #[arg(long)]
    price: Option<Decimal>,
    /// Tank capacity in liters.
    #[arg(long)]
    tank: Option<f64>,
}

fn parse_expense(raw: &str) -> Result<Expense, String> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let value: Decimal = value
        .trim()
        .parse()
        .map_err(|err| format!("invalid value {value:?}: {err}"))?;
    Expense::new(name.trim(), value).map_err(|err| err.to_string())
}

fn parse_economy(raw: &str) -> Result<f64, String> {
    let economy: f64 = raw.trim().parse().map_err(|err| format!("invalid number {raw:?}: {err}"))?;
    if !economy.is_finite() || economy < 0.1 {
        return Err(format!("fuel economy must be at least 0.1 km/l, got {raw}"));
    }
    Ok(economy)
}

pub async fn run(planner: &AppPlanner, command: Command) -> Result<(), GenericError> {
    match command {
        Command::Distance { origin, destination } => distance(planner, &origin, &destination).await,
        Command::Plan(args) => plan(planner, args).await,
        Command::List { filter } => list(planner, filter.as_deref().unwrap_or("")).await,
        Command::Expenses { id, expenses } => {
            let trip = planner.record_expenses(id, expenses).await?;
            print_trip(&trip);
            Ok(())
        }
        Command::Complete { id, undo } => {
            let trip = planner.set_completed(id, !undo).await?;
            print_trip(&trip);
            Ok(())
        }
        Command::Delete { id } => {
            planner.delete_trip(id).await?;
            println!("Trip {id} deleted.");
            Ok(())
        }
        Command::Profile(args) => profile(planner, args).await,
    }
}

async fn distance(planner: &AppPlanner, origin: &str, destination: &str) -> Result<(), GenericError> {
    let result = planner.resolver().resolve_distance(origin, destination).await;
    if let Some(origin) = &result.origin_resolved {
        println!("Origin:      {origin}");
    }
    if let Some(destination) = &result.destination_resolved {
        println!("Destination: {destination}");
    }
    match result.kilometers {
        Some(kilometers) => {
            println!("Distance:    {kilometers:.1} km");
            let profile = planner.profile_or_default().await?;
            match estimate_fuel_cost(
                kilometers,
                Some(profile.fuel_economy_km_per_liter),
                profile.fuel_price_per_liter,
            ) {
                Some(cost) => println!("Fuel:        R$ {cost:.2}"),
                None => println!("Fuel:        — (check your vehicle data)"),
            }
        }
        None => println!("Distance:    —"),
    }
    if let Some(failure) = result.failure {
        warn!("{}", failure);
        eprintln!("{}", failure.guidance());
    }
    Ok(())
}

async fn plan(planner: &AppPlanner, args: PlanArgs) -> Result<(), GenericError> {
    let draft = TripDraft {
        origin: args.origin,
        destination: args.destination,
        destination_postal_code: args.destination_postal_code,
        transport_mode: args.mode.map(TransportMode::from),
        departure_date: args.departure,
        return_date: args.return_date,
        photo_url: args.photo_url,
        expenses: (!args.expenses.is_empty()).then_some(args.expenses),
    };
    let planned = match args.id {
        Some(id) => planner.edit_trip(id, draft).await?,
        None => planner.new_trip(draft).await?,
    };
    print_trip(&planned.trip);
    if let Some(notice) = planned.notice {
        eprintln!("{notice}");
    }
    Ok(())
}

async fn list(planner: &AppPlanner, filter: &str) -> Result<(), GenericError> {
    let trips = planner.search_trips(filter).await?;
    if trips.is_empty() {
        println!("No trips found.");
    }
    for trip in &trips {
        print_trip(trip);
    }
    Ok(())
}

async fn profile(planner: &AppPlanner, args: ProfileArgs) -> Result<(), GenericError> {
    let mut profile = planner.profile_or_default().await?;
    let changed = args.economy.is_some() || args.price.is_some() || args.tank.is_some();
    if let Some(economy) = args.economy {
        profile.fuel_economy_km_per_liter = economy;
    }
    if let Some(price) = args.price {
        profile.fuel_price_per_liter = price;
    }
    if args.tank.is_some() {
        profile.tank_capacity_liters = args.tank;
    }
    if changed {
        planner.save_profile(&profile).await?;
    }
    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("Fuel economy: {} km/l", profile.fuel_economy_km_per_liter);
    println!("Fuel price:   R$ {:.2}/l", profile.fuel_price_per_liter);
    if let Some(tank) = profile.tank_capacity_liters {
        println!("Tank:         {tank} l");
    }
}

fn print_trip(trip: &Trip) {
    let id = trip.id.map(|id| id.to_string()).unwrap_or_default();
    let done = if trip.completed == Some(true) { " (done)" } else { "" };
    println!("#{id} {} → {} [{}]{done}", trip.origin, trip.destination, trip.transport_mode);

    if let Some(resolved) = &trip.resolved {
        println!("    from {}", resolved.origin);
        println!("    to   {}", resolved.destination);
    }
    if trip.departure_date.is_some() || trip.return_date.is_some() {
        let format = |date: Option<NaiveDate>| date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or("—".into());
        let days = trip.trip_length_days.map(|d| format!(" ({d} days)")).unwrap_or_default();
        println!("    dates {} → {}{days}", format(trip.departure_date), format(trip.return_date));
    }
    match trip.distance_km {
        Some(kilometers) => println!("    distance {kilometers:.1} km"),
        None => println!("    distance —"),
    }
    println!("    total R$ {:.2}", trip.estimated_total());
}
