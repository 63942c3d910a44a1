//! In-memory pet collection shared by the pet service and the analysis pipeline

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::{EmotionRecord, Pet};

/// Pets in server order
#[derive(Clone, Default)]
pub struct PetStore {
    pets: Arc<RwLock<Vec<Pet>>>,
}

impl PetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace_all(&self, pets: Vec<Pet>) {
        debug!("Pet store replaced with {} pets", pets.len());
        *self.pets.write().await = pets;
    }

    /// Replace the pet with the same id in place, or append it
    pub async fn upsert(&self, pet: Pet) {
        let mut pets = self.pets.write().await;
        match pets.iter_mut().find(|p| p.id == pet.id) {
            Some(existing) => *existing = pet,
            None => pets.push(pet),
        }
    }

    pub async fn get(&self, id: i64) -> Option<Pet> {
        self.pets.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<Pet> {
        self.pets.read().await.clone()
    }

    pub async fn contains(&self, id: i64) -> bool {
        self.pets.read().await.iter().any(|p| p.id == id)
    }

    pub async fn len(&self) -> usize {
        self.pets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pets.read().await.is_empty()
    }

    /// Insert `record` at the head of the pet's history
    pub async fn add_emotion_record(&self, pet_id: i64, record: EmotionRecord) -> AppResult<()> {
        let mut pets = self.pets.write().await;
        let pet = pets
            .iter_mut()
            .find(|p| p.id == pet_id)
            .ok_or_else(|| AppError::not_found("pet", pet_id))?;
        pet.emotion_history.insert(0, record);
        debug!(
            "Pet {} history now has {} records",
            pet_id,
            pet.emotion_history.len()
        );
        Ok(())
    }

    pub async fn clear_history(&self, pet_id: i64) -> AppResult<()> {
        let mut pets = self.pets.write().await;
        let pet = pets
            .iter_mut()
            .find(|p| p.id == pet_id)
            .ok_or_else(|| AppError::not_found("pet", pet_id))?;
        pet.emotion_history.clear();
        Ok(())
    }

    pub async fn remove(&self, pet_id: i64) -> Option<Pet> {
        let mut pets = self.pets.write().await;
        let index = pets.iter().position(|p| p.id == pet_id)?;
        Some(pets.remove(index))
    }
}
