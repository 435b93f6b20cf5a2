use sea_orm::DatabaseConnection;

use petadopt_core::usecase::Logged;

use crate::infra::db::{DbPetStore, DbPetTypeStore};
use crate::usecase::pet::{
    AdoptPetUseCase, CancelReservationUseCase, CreatePetUseCase, ListAvailablePetsUseCase,
    ReservePetUseCase,
};
use crate::usecase::pet_type::{
    ActivatePetTypeUseCase, CreatePetTypeUseCase, DeactivatePetTypeUseCase, ListPetTypesUseCase,
    UpdatePetTypeUseCase,
};

/// Shared application state handed to the command layer.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    fn store(&self) -> DbPetStore {
        DbPetStore {
            db: self.db.clone(),
        }
    }

    fn pet_types(&self) -> DbPetTypeStore {
        DbPetTypeStore {
            db: self.db.clone(),
        }
    }

    pub fn create_pet(&self) -> Logged<CreatePetUseCase<DbPetStore, DbPetTypeStore>> {
        Logged::new(CreatePetUseCase {
            repo: self.store(),
            pet_types: self.pet_types(),
        })
    }

    pub fn reserve_pet(&self) -> Logged<ReservePetUseCase<DbPetStore>> {
        Logged::new(ReservePetUseCase { repo: self.store() })
    }

    pub fn adopt_pet(&self) -> Logged<AdoptPetUseCase<DbPetStore>> {
        Logged::new(AdoptPetUseCase { repo: self.store() })
    }

    pub fn cancel_reservation(&self) -> Logged<CancelReservationUseCase<DbPetStore>> {
        Logged::new(CancelReservationUseCase { repo: self.store() })
    }

    pub fn list_available_pets(&self) -> Logged<ListAvailablePetsUseCase<DbPetStore>> {
        Logged::new(ListAvailablePetsUseCase { repo: self.store() })
    }

    pub fn create_pet_type(&self) -> Logged<CreatePetTypeUseCase<DbPetTypeStore>> {
        Logged::new(CreatePetTypeUseCase {
            repo: self.pet_types(),
        })
    }

    pub fn update_pet_type(&self) -> Logged<UpdatePetTypeUseCase<DbPetTypeStore>> {
        Logged::new(UpdatePetTypeUseCase {
            repo: self.pet_types(),
        })
    }

    pub fn activate_pet_type(&self) -> Logged<ActivatePetTypeUseCase<DbPetTypeStore>> {
        Logged::new(ActivatePetTypeUseCase {
            repo: self.pet_types(),
        })
    }

    pub fn deactivate_pet_type(&self) -> Logged<DeactivatePetTypeUseCase<DbPetTypeStore>> {
        Logged::new(DeactivatePetTypeUseCase {
            repo: self.pet_types(),
        })
    }

    pub fn list_pet_types(&self) -> Logged<ListPetTypesUseCase<DbPetTypeStore>> {
        Logged::new(ListPetTypesUseCase {
            repo: self.pet_types(),
        })
    }
}
