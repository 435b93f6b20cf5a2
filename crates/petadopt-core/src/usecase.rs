//! Command entry points and the decorators composed around them at startup.

#![allow(async_fn_in_trait)]

use std::fmt::Display;
use std::time::Instant;

/// One request type handled by a service.
pub trait UseCase {
    type Input: Send;
    type Output;
    type Error: Display;

    /// Short name used in logs.
    const NAME: &'static str;

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}

/// Logs the outcome and duration of every call to the wrapped use case.
pub struct Logged<U> {
    inner: U,
}

impl<U> Logged<U> {
    pub fn new(inner: U) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &U {
        &self.inner
    }
}

impl<U: UseCase> UseCase for Logged<U> {
    type Input = U::Input;
    type Output = U::Output;
    type Error = U::Error;

    const NAME: &'static str = U::NAME;

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let started = Instant::now();
        let result = self.inner.execute(input).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(use_case = U::NAME, elapsed_ms, "use case completed"),
            Err(e) => tracing::warn!(use_case = U::NAME, elapsed_ms, error = %e, "use case failed"),
        }
        result
    }
}
