use sea_orm::DatabaseConnection;

use petadopt_core::usecase::Logged;

use crate::infra::db::DbUserStore;
use crate::usecase::user::{
    ActivateUserUseCase, ChangePasswordUseCase, PromoteToAdminUseCase, RecordLoginUseCase,
    RegisterUserUseCase, SuspendUserUseCase, UpdateProfileUseCase,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    fn store(&self) -> DbUserStore {
        DbUserStore {
            db: self.db.clone(),
        }
    }

    pub fn register_user(&self) -> Logged<RegisterUserUseCase<DbUserStore>> {
        Logged::new(RegisterUserUseCase { repo: self.store() })
    }

    pub fn update_profile(&self) -> Logged<UpdateProfileUseCase<DbUserStore>> {
        Logged::new(UpdateProfileUseCase { repo: self.store() })
    }

    pub fn change_password(&self) -> Logged<ChangePasswordUseCase<DbUserStore>> {
        Logged::new(ChangePasswordUseCase { repo: self.store() })
    }

    pub fn promote_to_admin(&self) -> Logged<PromoteToAdminUseCase<DbUserStore>> {
        Logged::new(PromoteToAdminUseCase { repo: self.store() })
    }

    pub fn suspend_user(&self) -> Logged<SuspendUserUseCase<DbUserStore>> {
        Logged::new(SuspendUserUseCase { repo: self.store() })
    }

    pub fn activate_user(&self) -> Logged<ActivateUserUseCase<DbUserStore>> {
        Logged::new(ActivateUserUseCase { repo: self.store() })
    }

    pub fn record_login(&self) -> Logged<RecordLoginUseCase<DbUserStore>> {
        Logged::new(RecordLoginUseCase { repo: self.store() })
    }
}
