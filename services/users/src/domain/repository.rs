#![allow(async_fn_in_trait)]

use petadopt_core::domain::AggregateStore;
use petadopt_core::error::StoreError;

use crate::domain::types::{Email, User};

pub trait UserRepository: AggregateStore<User> {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;
}
