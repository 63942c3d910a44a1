//! Persisted copy of the last fetched pet list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::AppResult;
use crate::models::Pet;
use crate::utils::fs::{read_json, remove_if_exists, write_json};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    fetched_at: DateTime<Utc>,
    pets: Vec<Pet>,
}

/// Pet list plus fetch time, served while younger than the freshness window
#[derive(Debug, Clone)]
pub struct PetListCache {
    path: PathBuf,
    freshness: Duration,
}

impl PetListCache {
    pub fn new<P: AsRef<Path>>(path: P, freshness: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            freshness,
        }
    }

    /// Cached list if it was fetched within the freshness window of `now`
    pub async fn load_fresh(&self, now: DateTime<Utc>) -> Option<Vec<Pet>> {
        let snapshot = match read_json::<Snapshot>(&self.path).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(e) => {
                warn!("Ignoring unreadable pet list cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        let age = now.signed_duration_since(snapshot.fetched_at);
        let fresh = age
            .to_std()
            .map(|age| age < self.freshness)
            .unwrap_or(false);
        if fresh {
            debug!("Serving {} pets from list cache", snapshot.pets.len());
            Some(snapshot.pets)
        } else {
            debug!("Pet list cache is stale ({}s old)", age.num_seconds());
            None
        }
    }

    pub async fn store(&self, pets: &[Pet], fetched_at: DateTime<Utc>) -> AppResult<()> {
        let snapshot = Snapshot {
            fetched_at,
            pets: pets.to_vec(),
        };
        write_json(&self.path, &snapshot).await?;
        Ok(())
    }

    /// Replace one pet inside the stored snapshot, keeping its fetch time
    ///
    /// Returns whether a snapshot held that pet. Without a snapshot nothing is
    /// written and the next listing fetches from the backend.
    pub async fn refresh_pet(&self, pet: &Pet) -> AppResult<bool> {
        let Some(mut snapshot) = read_json::<Snapshot>(&self.path).await? else {
            return Ok(false);
        };
        let Some(slot) = snapshot.pets.iter_mut().find(|p| p.id == pet.id) else {
            return Ok(false);
        };
        *slot = pet.clone();
        write_json(&self.path, &snapshot).await?;
        debug!("Refreshed pet {} in list cache", pet.id);
        Ok(true)
    }

    pub async fn invalidate(&self) -> AppResult<()> {
        remove_if_exists(&self.path).await?;
        Ok(())
    }
}
