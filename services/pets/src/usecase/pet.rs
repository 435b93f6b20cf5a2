use uuid::Uuid;

use petadopt_core::usecase::UseCase;

use crate::domain::repository::{PetRepository, PetTypeRepository};
use crate::domain::types::{Pet, PetStatus};
use crate::error::PetsServiceError;

async fn load<R: PetRepository>(repo: &R, pet_id: Uuid) -> Result<Pet, PetsServiceError> {
    repo.find_by_id(pet_id)
        .await?
        .ok_or(PetsServiceError::PetNotFound)
}

// ── CreatePet ────────────────────────────────────────────────────────────────

pub struct CreatePetInput {
    pub name: String,
    pub pet_type_id: Uuid,
}

pub struct CreatePetUseCase<R: PetRepository, T: PetTypeRepository> {
    pub repo: R,
    pub pet_types: T,
}

impl<R: PetRepository, T: PetTypeRepository> UseCase for CreatePetUseCase<R, T> {
    type Input = CreatePetInput;
    type Output = Pet;
    type Error = PetsServiceError;

    const NAME: &'static str = "create_pet";

    async fn execute(&self, input: CreatePetInput) -> Result<Pet, PetsServiceError> {
        let pet_type = self
            .pet_types
            .find_by_id(input.pet_type_id)
            .await?
            .ok_or(PetsServiceError::PetTypeNotFound)?;
        let mut pet = Pet::create(&input.name, &pet_type)?;
        self.repo.save(&mut pet).await?;
        Ok(pet)
    }
}

// ── ReservePet ───────────────────────────────────────────────────────────────

pub struct ReservePetUseCase<R: PetRepository> {
    pub repo: R,
}

impl<R: PetRepository> UseCase for ReservePetUseCase<R> {
    type Input = Uuid;
    type Output = Pet;
    type Error = PetsServiceError;

    const NAME: &'static str = "reserve_pet";

    async fn execute(&self, pet_id: Uuid) -> Result<Pet, PetsServiceError> {
        let mut pet = load(&self.repo, pet_id).await?;
        pet.reserve()?;
        self.repo.save(&mut pet).await?;
        Ok(pet)
    }
}

// ── AdoptPet ─────────────────────────────────────────────────────────────────

pub struct AdoptPetUseCase<R: PetRepository> {
    pub repo: R,
}

impl<R: PetRepository> UseCase for AdoptPetUseCase<R> {
    type Input = Uuid;
    type Output = Pet;
    type Error = PetsServiceError;

    const NAME: &'static str = "adopt_pet";

    async fn execute(&self, pet_id: Uuid) -> Result<Pet, PetsServiceError> {
        let mut pet = load(&self.repo, pet_id).await?;
        pet.adopt()?;
        self.repo.save(&mut pet).await?;
        Ok(pet)
    }
}

// ── CancelReservation ────────────────────────────────────────────────────────

pub struct CancelReservationUseCase<R: PetRepository> {
    pub repo: R,
}

impl<R: PetRepository> UseCase for CancelReservationUseCase<R> {
    type Input = Uuid;
    type Output = Pet;
    type Error = PetsServiceError;

    const NAME: &'static str = "cancel_reservation";

    async fn execute(&self, pet_id: Uuid) -> Result<Pet, PetsServiceError> {
        let mut pet = load(&self.repo, pet_id).await?;
        pet.cancel_reservation()?;
        self.repo.save(&mut pet).await?;
        Ok(pet)
    }
}

// ── ListAvailablePets ────────────────────────────────────────────────────────

pub struct ListAvailablePetsUseCase<R: PetRepository> {
    pub repo: R,
}

impl<R: PetRepository> UseCase for ListAvailablePetsUseCase<R> {
    type Input = ();
    type Output = Vec<Pet>;
    type Error = PetsServiceError;

    const NAME: &'static str = "list_available_pets";

    async fn execute(&self, _input: ()) -> Result<Vec<Pet>, PetsServiceError> {
        Ok(self.repo.list_by_status(PetStatus::Available).await?)
    }
}
