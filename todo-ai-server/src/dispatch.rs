//! Bounded, isolated execution of model invocations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use todo_ai_common::Capability;

use crate::config::ServerConfig;
use crate::error::{Error, Result};

/// Runs each model invocation on its own task.
///
/// At most `max_concurrent` invocations run at once. Waiting for a slot and
/// running the invocation share one deadline, which is enforced on the
/// invocation task itself: a dropped caller never holds a slot past it. A
/// failing or panicking invocation only affects its own request.
pub struct Dispatcher {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.max_concurrent_invocations,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Run `invocation` for `capability`.
    pub async fn run<F, T>(&self, capability: Capability, invocation: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = Instant::now() + self.timeout;

        let permit = match tokio::time::timeout_at(deadline, self.permits.clone().acquire_owned())
            .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(e)) => return Err(Error::Internal(format!("Semaphore error: {}", e))),
            Err(_) => return Err(self.timed_out(capability)),
        };

        // Enforced inside the task: the permit is bounded even if the caller is dropped.
        let task = tokio::spawn(async move {
            let _permit = permit;
            tokio::time::timeout_at(deadline, invocation).await
        });

        match task.await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => {
                tracing::error!(capability = %capability, "Invocation failed: {}", e);
                Err(e)
            }
            Ok(Err(_)) => Err(self.timed_out(capability)),
            Err(join_error) => {
                tracing::error!(capability = %capability, "Invocation task failed: {}", join_error);
                Err(Error::Internal(format!("{} invocation aborted", capability)))
            }
        }
    }

    fn timed_out(&self, capability: Capability) -> Error {
        tracing::warn!(
            capability = %capability,
            "Invocation timed out after {:?}",
            self.timeout
        );
        Error::Timeout(self.timeout.as_secs())
    }

    /// Number of invocation slots currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
