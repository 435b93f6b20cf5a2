use uuid::Uuid;

use petadopt_core::usecase::UseCase;

use crate::domain::repository::PetTypeRepository;
use crate::domain::types::PetType;
use crate::error::PetsServiceError;

async fn load<T: PetTypeRepository>(
    repo: &T,
    pet_type_id: Uuid,
) -> Result<PetType, PetsServiceError> {
    repo.find_by_id(pet_type_id)
        .await?
        .ok_or(PetsServiceError::PetTypeNotFound)
}

// ── CreatePetType ────────────────────────────────────────────────────────────

pub struct CreatePetTypeInput {
    pub code: String,
    pub name: String,
}

pub struct CreatePetTypeUseCase<T: PetTypeRepository> {
    pub repo: T,
}

impl<T: PetTypeRepository> UseCase for CreatePetTypeUseCase<T> {
    type Input = CreatePetTypeInput;
    type Output = PetType;
    type Error = PetsServiceError;

    const NAME: &'static str = "create_pet_type";

    async fn execute(&self, input: CreatePetTypeInput) -> Result<PetType, PetsServiceError> {
        let pet_type = PetType::create(&input.code, &input.name)?;
        if self.repo.find_by_code(pet_type.code()).await?.is_some() {
            return Err(PetsServiceError::PetTypeAlreadyExists(
                pet_type.code().to_string(),
            ));
        }
        match self.repo.insert(&pet_type).await {
            Ok(()) => Ok(pet_type),
            Err(e) if e.is_duplicate() => Err(PetsServiceError::PetTypeAlreadyExists(
                pet_type.code().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

// ── UpdatePetType ────────────────────────────────────────────────────────────

pub struct UpdatePetTypeInput {
    pub pet_type_id: Uuid,
    pub name: String,
}

pub struct UpdatePetTypeUseCase<T: PetTypeRepository> {
    pub repo: T,
}

impl<T: PetTypeRepository> UseCase for UpdatePetTypeUseCase<T> {
    type Input = UpdatePetTypeInput;
    type Output = PetType;
    type Error = PetsServiceError;

    const NAME: &'static str = "update_pet_type";

    async fn execute(&self, input: UpdatePetTypeInput) -> Result<PetType, PetsServiceError> {
        let mut pet_type = load(&self.repo, input.pet_type_id).await?;
        pet_type.update_name(&input.name)?;
        self.repo.update(&pet_type).await?;
        Ok(pet_type)
    }
}

// ── ActivatePetType ──────────────────────────────────────────────────────────

pub struct ActivatePetTypeUseCase<T: PetTypeRepository> {
    pub repo: T,
}

impl<T: PetTypeRepository> UseCase for ActivatePetTypeUseCase<T> {
    type Input = Uuid;
    type Output = PetType;
    type Error = PetsServiceError;

    const NAME: &'static str = "activate_pet_type";

    async fn execute(&self, pet_type_id: Uuid) -> Result<PetType, PetsServiceError> {
        let mut pet_type = load(&self.repo, pet_type_id).await?;
        pet_type.activate()?;
        self.repo.update(&pet_type).await?;
        Ok(pet_type)
    }
}

// ── DeactivatePetType ────────────────────────────────────────────────────────

pub struct DeactivatePetTypeUseCase<T: PetTypeRepository> {
    pub repo: T,
}

impl<T: PetTypeRepository> UseCase for DeactivatePetTypeUseCase<T> {
    type Input = Uuid;
    type Output = PetType;
    type Error = PetsServiceError;

    const NAME: &'static str = "deactivate_pet_type";

    async fn execute(&self, pet_type_id: Uuid) -> Result<PetType, PetsServiceError> {
        let mut pet_type = load(&self.repo, pet_type_id).await?;
        pet_type.deactivate()?;
        self.repo.update(&pet_type).await?;
        Ok(pet_type)
    }
}

// ── ListPetTypes ─────────────────────────────────────────────────────────────

pub struct ListPetTypesUseCase<T: PetTypeRepository> {
    pub repo: T,
}

impl<T: PetTypeRepository> UseCase for ListPetTypesUseCase<T> {
    /// `true` lists only active types.
    type Input = bool;
    type Output = Vec<PetType>;
    type Error = PetsServiceError;

    const NAME: &'static str = "list_pet_types";

    async fn execute(&self, active_only: bool) -> Result<Vec<PetType>, PetsServiceError> {
        Ok(self.repo.list(active_only).await?)
    }
}
