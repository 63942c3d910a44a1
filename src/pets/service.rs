use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::list_cache::PetListCache;
use super::store::PetStore;
use crate::api::PetBackend;
use crate::errors::{AppError, AppResult};
use crate::models::{Pet, PetForm};
use crate::utils::ImageNormalizer;

/// Pet CRUD against the backend, mirrored into the local store
#[derive(Clone)]
pub struct PetService {
    backend: Arc<dyn PetBackend>,
    store: PetStore,
    list_cache: PetListCache,
    normalizer: ImageNormalizer,
}

impl PetService {
    pub fn new(
        backend: Arc<dyn PetBackend>,
        store: PetStore,
        list_cache: PetListCache,
        normalizer: ImageNormalizer,
    ) -> Self {
        Self {
            backend,
            store,
            list_cache,
            normalizer,
        }
    }

    pub fn store(&self) -> &PetStore {
        &self.store
    }

    /// All pets, from the list cache while it is fresh unless `force_refresh`
    pub async fn list_pets(&self, force_refresh: bool) -> AppResult<Vec<Pet>> {
        let now = Utc::now();
        if !force_refresh && let Some(pets) = self.list_cache.load_fresh(now).await {
            self.store.replace_all(pets.clone()).await;
            return Ok(pets);
        }

        let pets = self.backend.list_pets().await?;
        info!("Fetched {} pets", pets.len());
        self.store.replace_all(pets.clone()).await;
        if let Err(e) = self.list_cache.store(&pets, now).await {
            warn!("Failed to persist pet list cache: {}", e);
        }
        Ok(pets)
    }

    pub async fn pet_details(&self, id: i64) -> AppResult<Pet> {
        let pet = self.backend.get_pet(id).await?;
        self.store.upsert(pet.clone()).await;
        Ok(pet)
    }

    /// Create a pet; a name and a photo are required before anything is sent
    pub async fn add_pet(&self, form: PetForm) -> AppResult<Pet> {
        Self::validate_name(&form)?;
        if form.image.as_ref().is_none_or(|image| image.is_empty()) {
            return Err(AppError::validation("Please select an image for your pet"));
        }

        let form = self.normalize_form(form)?;
        let pet = self.backend.create_pet(&form).await?;
        info!("Added pet {} ({})", pet.id, pet.name);

        self.store.upsert(pet.clone()).await;
        self.invalidate_list().await;
        Ok(pet)
    }

    /// Update a pet's profile; the photo is optional
    pub async fn update_pet(&self, id: i64, form: PetForm) -> AppResult<Pet> {
        Self::validate_name(&form)?;

        let form = self.normalize_form(form)?;
        let pet = self.backend.update_pet(id, &form).await?;
        info!("Updated pet {} ({})", pet.id, pet.name);

        self.store.upsert(pet.clone()).await;
        self.invalidate_list().await;
        Ok(pet)
    }

    pub async fn remove_pet(&self, id: i64) -> AppResult<()> {
        self.backend.delete_pet(id).await?;
        if self.store.remove(id).await.is_none() {
            debug!("Removed pet {} was not in the local store", id);
        }
        info!("Removed pet {}", id);
        self.invalidate_list().await;
        Ok(())
    }

    fn validate_name(form: &PetForm) -> AppResult<()> {
        if form.name.trim().is_empty() {
            return Err(AppError::validation("Please enter your pet's name"));
        }
        Ok(())
    }

    fn normalize_form(&self, mut form: PetForm) -> AppResult<PetForm> {
        form.name = form.name.trim().to_string();
        if let Some(image) = form.image.take().filter(|image| !image.is_empty()) {
            form.image = Some(self.normalizer.normalize(&image)?.jpeg);
        }
        Ok(form)
    }

    async fn invalidate_list(&self) {
        if let Err(e) = self.list_cache.invalidate().await {
            warn!("Failed to invalidate pet list cache: {}", e);
        }
    }
}
