use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use petadopt_core::domain::{Aggregate, AggregateStore};
use petadopt_core::error::StoreError;
use petadopt_core::persistence::{VersionColumns, insert_failed, save_aggregate};
use petadopt_pets_schema::{pet_types, pets};

use crate::domain::repository::{PetRepository, PetTypeRepository};
use crate::domain::types::{Pet, PetName, PetStatus, PetType, PetTypeCode};

// ── Pet store ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPetStore {
    pub db: DatabaseConnection,
}

impl AggregateStore<Pet> for DbPetStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Pet>, StoreError> {
        let model = pets::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find pet by id")?;
        model.map(pet_from_model).transpose()
    }

    async fn save(&self, pet: &mut Pet) -> Result<(), StoreError> {
        save_aggregate::<pets::Entity, _, _>(
            &self.db,
            pet,
            VersionColumns {
                id: pets::Column::Id,
                version: pets::Column::Version,
            },
            active_model_from_pet,
        )
        .await
    }
}

impl PetRepository for DbPetStore {
    async fn list_by_status(&self, status: PetStatus) -> Result<Vec<Pet>, StoreError> {
        let models = pets::Entity::find()
            .filter(pets::Column::Status.eq(status.as_str()))
            .order_by_asc(pets::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list pets by status")?;
        models.into_iter().map(pet_from_model).collect()
    }
}

fn active_model_from_pet(pet: &Pet, version: i32) -> pets::ActiveModel {
    pets::ActiveModel {
        id: Set(pet.id()),
        name: Set(pet.name().as_str().to_owned()),
        pet_type_id: Set(pet.pet_type_id()),
        status: Set(pet.status().as_str().to_owned()),
        version: Set(version),
        created_at: Set(pet.created_at()),
        updated_at: Set(pet.updated_at()),
    }
}

fn pet_from_model(model: pets::Model) -> Result<Pet, StoreError> {
    let name = PetName::parse(&model.name)
        .map_err(|e| anyhow::anyhow!("stored pet {} has invalid name: {e}", model.id))?;
    let status = model.status.parse::<PetStatus>()?;
    Ok(Pet::restore(
        model.id,
        name,
        model.pet_type_id,
        status,
        model.version,
        model.created_at,
        model.updated_at,
    ))
}

// ── Pet type store ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPetTypeStore {
    pub db: DatabaseConnection,
}

impl PetTypeRepository for DbPetTypeStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PetType>, StoreError> {
        let model = pet_types::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find pet type by id")?;
        model.map(pet_type_from_model).transpose()
    }

    async fn find_by_code(&self, code: &PetTypeCode) -> Result<Option<PetType>, StoreError> {
        let model = pet_types::Entity::find()
            .filter(pet_types::Column::Code.eq(code.as_str()))
            .one(&self.db)
            .await
            .context("find pet type by code")?;
        model.map(pet_type_from_model).transpose()
    }

    async fn list(&self, active_only: bool) -> Result<Vec<PetType>, StoreError> {
        let mut query = pet_types::Entity::find().order_by_asc(pet_types::Column::Code);
        if active_only {
            query = query.filter(pet_types::Column::IsActive.eq(true));
        }
        let models = query.all(&self.db).await.context("list pet types")?;
        models.into_iter().map(pet_type_from_model).collect()
    }

    async fn insert(&self, pet_type: &PetType) -> Result<(), StoreError> {
        pet_types::Entity::insert(active_model_from_pet_type(pet_type))
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| insert_failed(e, pet_type.id()))?;
        tracing::debug!(pet_type_id = %pet_type.id(), code = %pet_type.code(), "pet type added");
        Ok(())
    }

    async fn update(&self, pet_type: &PetType) -> Result<(), StoreError> {
        active_model_from_pet_type(pet_type)
            .update(&self.db)
            .await
            .context("update pet type")?;
        Ok(())
    }
}

fn active_model_from_pet_type(pet_type: &PetType) -> pet_types::ActiveModel {
    pet_types::ActiveModel {
        id: Set(pet_type.id()),
        code: Set(pet_type.code().as_str().to_owned()),
        name: Set(pet_type.name().to_owned()),
        is_active: Set(pet_type.is_active()),
        created_at: Set(pet_type.created_at()),
        updated_at: Set(pet_type.updated_at()),
    }
}

fn pet_type_from_model(model: pet_types::Model) -> Result<PetType, StoreError> {
    let code = PetTypeCode::parse(&model.code)
        .map_err(|e| anyhow::anyhow!("stored pet type {} has invalid code: {e}", model.id))?;
    Ok(PetType::restore(
        model.id,
        code,
        model.name,
        model.is_active,
        model.created_at,
        model.updated_at,
    ))
}
