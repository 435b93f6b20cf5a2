#![allow(async_fn_in_trait)]

use uuid::Uuid;

use petadopt_core::domain::AggregateStore;
use petadopt_core::error::StoreError;

use crate::domain::types::{Pet, PetStatus, PetType, PetTypeCode};

/// Store for pets; saving also enqueues the pet's pending events.
pub trait PetRepository: AggregateStore<Pet> {
    /// Pets with `status`, oldest first.
    async fn list_by_status(&self, status: PetStatus) -> Result<Vec<Pet>, StoreError>;
}

/// Store for the pet type catalog.
pub trait PetTypeRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PetType>, StoreError>;

    async fn find_by_code(&self, code: &PetTypeCode) -> Result<Option<PetType>, StoreError>;

    /// Pet types ordered by code, optionally only the active ones.
    async fn list(&self, active_only: bool) -> Result<Vec<PetType>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the code is taken.
    async fn insert(&self, pet_type: &PetType) -> Result<(), StoreError>;

    async fn update(&self, pet_type: &PetType) -> Result<(), StoreError>;
}
