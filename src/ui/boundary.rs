//! Error Boundary
//!
//! Runs the UI tree as its own task so a panic anywhere inside it is caught
//! and reported instead of tearing the process down silently.

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("{name} panicked: {message}")]
    Panicked { name: String, message: String },
    #[error("{name} was cancelled")]
    Cancelled { name: String },
}

/// Top-level failure boundary
pub struct ErrorBoundary {
    name: String,
}

impl ErrorBoundary {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Run `task` to completion, converting a panic into an error
    pub async fn run<F, T>(&self, task: F) -> Result<T, BoundaryError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::spawn(task).await {
            Ok(output) => Ok(output),
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Uncaught failure in {}: {}", self.name, message);
                Err(BoundaryError::Panicked {
                    name: self.name.clone(),
                    message,
                })
            }
            Err(_) => Err(BoundaryError::Cancelled {
                name: self.name.clone(),
            }),
        }
    }
}
