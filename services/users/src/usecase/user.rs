use uuid::Uuid;

use petadopt_core::usecase::UseCase;

use crate::domain::repository::UserRepository;
use crate::domain::types::{Email, FullName, PhoneNumber, User, UserPreferences};
use crate::error::UsersServiceError;

async fn load<R: UserRepository>(repo: &R, user_id: Uuid) -> Result<User, UsersServiceError> {
    repo.find_by_id(user_id)
        .await?
        .ok_or(UsersServiceError::UserNotFound)
}

// ── RegisterUser ─────────────────────────────────────────────────────────────

pub struct RegisterUserInput {
    pub email: String,
    pub full_name: String,
    /// Already hashed by the caller.
    pub password_hash: String,
    pub phone_number: Option<String>,
}

pub struct RegisterUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UseCase for RegisterUserUseCase<R> {
    type Input = RegisterUserInput;
    type Output = User;
    type Error = UsersServiceError;

    const NAME: &'static str = "register_user";

    async fn execute(&self, input: RegisterUserInput) -> Result<User, UsersServiceError> {
        let email = Email::parse(&input.email)?;
        let full_name = FullName::parse(&input.full_name)?;
        let phone_number = input
            .phone_number
            .as_deref()
            .map(PhoneNumber::parse)
            .transpose()?;

        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(UsersServiceError::EmailAlreadyRegistered);
        }

        let mut user = User::register(email, full_name, input.password_hash, phone_number);
        self.repo.save(&mut user).await?;
        Ok(user)
    }
}

// ── UpdateProfile ────────────────────────────────────────────────────────────

pub struct UpdateProfileInput {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub preferences: Option<UserPreferences>,
}

pub struct UpdateProfileUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UseCase for UpdateProfileUseCase<R> {
    type Input = UpdateProfileInput;
    type Output = User;
    type Error = UsersServiceError;

    const NAME: &'static str = "update_profile";

    async fn execute(&self, input: UpdateProfileInput) -> Result<User, UsersServiceError> {
        let full_name = input.full_name.as_deref().map(FullName::parse).transpose()?;
        let phone_number = input
            .phone_number
            .as_deref()
            .map(PhoneNumber::parse)
            .transpose()?;

        let mut user = load(&self.repo, input.user_id).await?;
        user.update_profile(full_name, phone_number, input.preferences)?;
        self.repo.save(&mut user).await?;
        Ok(user)
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub user_id: Uuid,
    pub password_hash: String,
}

pub struct ChangePasswordUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UseCase for ChangePasswordUseCase<R> {
    type Input = ChangePasswordInput;
    type Output = ();
    type Error = UsersServiceError;

    const NAME: &'static str = "change_password";

    async fn execute(&self, input: ChangePasswordInput) -> Result<(), UsersServiceError> {
        let mut user = load(&self.repo, input.user_id).await?;
        user.change_password(input.password_hash)?;
        self.repo.save(&mut user).await?;
        Ok(())
    }
}

// ── PromoteToAdmin ───────────────────────────────────────────────────────────

pub struct PromoteToAdminUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UseCase for PromoteToAdminUseCase<R> {
    type Input = Uuid;
    type Output = User;
    type Error = UsersServiceError;

    const NAME: &'static str = "promote_to_admin";

    async fn execute(&self, user_id: Uuid) -> Result<User, UsersServiceError> {
        let mut user = load(&self.repo, user_id).await?;
        user.promote_to_admin()?;
        self.repo.save(&mut user).await?;
        Ok(user)
    }
}

// ── SuspendUser ──────────────────────────────────────────────────────────────

pub struct SuspendUserInput {
    pub user_id: Uuid,
    pub reason: String,
}

pub struct SuspendUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UseCase for SuspendUserUseCase<R> {
    type Input = SuspendUserInput;
    type Output = User;
    type Error = UsersServiceError;

    const NAME: &'static str = "suspend_user";

    async fn execute(&self, input: SuspendUserInput) -> Result<User, UsersServiceError> {
        let mut user = load(&self.repo, input.user_id).await?;
        user.suspend(&input.reason)?;
        self.repo.save(&mut user).await?;
        Ok(user)
    }
}

// ── ActivateUser ─────────────────────────────────────────────────────────────

pub struct ActivateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UseCase for ActivateUserUseCase<R> {
    type Input = Uuid;
    type Output = User;
    type Error = UsersServiceError;

    const NAME: &'static str = "activate_user";

    async fn execute(&self, user_id: Uuid) -> Result<User, UsersServiceError> {
        let mut user = load(&self.repo, user_id).await?;
        user.activate()?;
        self.repo.save(&mut user).await?;
        Ok(user)
    }
}

// ── RecordLogin ──────────────────────────────────────────────────────────────

pub struct RecordLoginUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UseCase for RecordLoginUseCase<R> {
    type Input = Uuid;
    type Output = ();
    type Error = UsersServiceError;

    const NAME: &'static str = "record_login";

    async fn execute(&self, user_id: Uuid) -> Result<(), UsersServiceError> {
        let mut user = load(&self.repo, user_id).await?;
        user.record_login();
        self.repo.save(&mut user).await?;
        Ok(())
    }
}
