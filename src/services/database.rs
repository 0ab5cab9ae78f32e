use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use log::*;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::trip::{Trip, UserProfile};
use crate::TripPlannerError;

pub const TRIPS_KEY: &str = "pv_trips_local";
pub const USER_KEY: &str = "pv_user_local";

/// Raw string storage under fixed keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, TripPlannerError>;
    async fn set(&self, key: &str, value: String) -> Result<(), TripPlannerError>;
}

/// One `<key>.json` file per key inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TripPlannerError> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TripPlannerError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // Write then rename so a crash never leaves half a collection behind.
        let target = self.path(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&staging, value).await?;
        tokio::fs::rename(&staging, &target).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TripPlannerError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TripPlannerError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
pub trait TripStorageService: Send + Sync {
    async fn list_trips(&self) -> Result<Vec<Trip>, TripPlannerError>;
    async fn get_trip(&self, id: i64) -> Result<Option<Trip>, TripPlannerError>;
    /// Upserts by id, assigning one when the trip has none. Returns the stored trip.
    async fn save_trip(&self, trip: Trip) -> Result<Trip, TripPlannerError>;
    async fn delete_trip(&self, id: i64) -> Result<(), TripPlannerError>;
    async fn get_profile(&self) -> Result<Option<UserProfile>, TripPlannerError>;
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), TripPlannerError>;
}

/// Trips and the user profile kept as two JSON documents in a [`KeyValueStore`].
///
/// Every write rewrites the whole trip collection; the last writer wins.
pub struct TripRepository<S> {
    store: S,
}

impl<S: KeyValueStore> TripRepository<S> {
    pub fn new(store: S) -> Self {
        TripRepository { store }
    }

    /// Missing or unreadable documents read as "no data".
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, TripPlannerError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("Ignoring malformed data stored under {}: {}", key, err);
                Ok(None)
            }
        }
    }

    async fn write_trips(&self, trips: &[Trip]) -> Result<(), TripPlannerError> {
        let json = serde_json::to_string(trips)?;
        self.store.set(TRIPS_KEY, json).await
    }
}

fn new_trip_id(trips: &[Trip]) -> i64 {
    let mut id = chrono::Utc::now().timestamp_millis();
    while trips.iter().any(|trip| trip.id == Some(id)) {
        id += 1;
    }
    id
}

#[async_trait]
impl<S: KeyValueStore> TripStorageService for TripRepository<S> {
    async fn list_trips(&self) -> Result<Vec<Trip>, TripPlannerError> {
        Ok(self.read_json(TRIPS_KEY).await?.unwrap_or_default())
    }

    async fn get_trip(&self, id: i64) -> Result<Option<Trip>, TripPlannerError> {
        let trips = self.list_trips().await?;
        Ok(trips.into_iter().find(|trip| trip.id == Some(id)))
    }

    async fn save_trip(&self, mut trip: Trip) -> Result<Trip, TripPlannerError> {
        let mut trips = self.list_trips().await?;
        match trip.id {
            Some(id) => match trips.iter_mut().find(|stored| stored.id == Some(id)) {
                Some(stored) => *stored = trip.clone(),
                None => trips.push(trip.clone()),
            },
            None => {
                trip.id = Some(new_trip_id(&trips));
                trips.push(trip.clone());
            }
        }
        self.write_trips(&trips).await?;
        debug!("Saved trip {:?} ({} stored).", trip.id, trips.len());
        Ok(trip)
    }

    async fn delete_trip(&self, id: i64) -> Result<(), TripPlannerError> {
        let mut trips = self.list_trips().await?;
        trips.retain(|trip| trip.id != Some(id));
        self.write_trips(&trips).await
    }

    async fn get_profile(&self) -> Result<Option<UserProfile>, TripPlannerError> {
        self.read_json(USER_KEY).await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), TripPlannerError> {
        let json = serde_json::to_string(profile)?;
        self.store.set(USER_KEY, json).await
    }
}
