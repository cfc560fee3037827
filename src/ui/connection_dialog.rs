//! Connection Dialog
//!
//! Modal form collecting the OpenAlgo host URL and API key. Submitting
//! validates the key against the server; on success the key is stored, the
//! preferences returned with it are hydrated into the store and the parent is
//! notified with `DialogEvent::Saved`.
//!
//! The host URL is saved on every submit attempt, before the request. The
//! API key is saved only after the server accepted it.

use std::sync::mpsc::Sender;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::{ApiError, ChartEndpoint, ChartResponse, ResponseClass, API_KEY_PAGE_PATH, LOGIN_PATH};
use crate::data::{CredentialStore, PreferenceBag};

/// Events from the connection dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    /// The key was validated and stored
    Saved { api_key: String },
    /// The dialog was dismissed
    Closed,
}

/// Errors shown under the API key field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("Please enter your API key")]
    EmptyApiKey,
    #[error("Invalid API key. Please check your credentials and try again.")]
    InvalidApiKey,
    #[error("Server error: {0}. Please try again later.")]
    Server(u16),
    #[error("Could not connect to OpenAlgo server. Please check if the server is running.")]
    Connection,
    #[error("Could not save settings: {0}")]
    Storage(String),
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Key accepted and stored; carries the trimmed key
    Connected(String),
    /// Validation failed; the error is also set on the dialog
    Failed(DialogError),
    /// A validation is already in flight
    Busy,
    /// The dialog was closed before the response was handled
    Cancelled,
}

/// A validation request that has been prepared but not yet sent
#[derive(Debug)]
pub struct PendingValidation {
    host_url: String,
    api_key: String,
    cancel: CancellationToken,
}

impl PendingValidation {
    /// Send the request, giving up as soon as the dialog is closed
    pub async fn run<E: ChartEndpoint + ?Sized>(self, endpoint: &E) -> ValidationResult {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => ValidationOutcome::Cancelled,
            result = endpoint.fetch_chart(&self.host_url, &self.api_key) => match result {
                Ok(response) => ValidationOutcome::Response(response),
                Err(e) => ValidationOutcome::Transport(e),
            },
        };
        ValidationResult {
            api_key: self.api_key,
            outcome,
        }
    }
}

/// Finished validation, to be applied with [`ConnectionDialog::finish_submit`]
#[derive(Debug)]
pub struct ValidationResult {
    api_key: String,
    outcome: ValidationOutcome,
}

#[derive(Debug)]
enum ValidationOutcome {
    Response(ChartResponse),
    Transport(ApiError),
    Cancelled,
}

/// Connection dialog state
pub struct ConnectionDialog {
    credentials: CredentialStore,
    host_url: String,
    api_key: String,
    show_api_key: bool,
    error: Option<DialogError>,
    is_validating: bool,
    in_flight: Option<CancellationToken>,
    closed: bool,
    event_tx: Sender<DialogEvent>,
}

impl ConnectionDialog {
    /// Open the dialog with the stored host URL (or the default) and an empty key
    pub fn new(credentials: CredentialStore, event_tx: Sender<DialogEvent>) -> Self {
        let host_url = credentials.host_url();
        Self {
            credentials,
            host_url,
            api_key: String::new(),
            show_api_key: false,
            error: None,
            is_validating: false,
            in_flight: None,
            closed: false,
            event_tx,
        }
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    pub fn set_host_url(&mut self, host_url: impl Into<String>) {
        self.host_url = host_url.into();
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Editing the key clears any previous error
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
        self.error = None;
    }

    pub fn toggle_api_key_visibility(&mut self) {
        self.show_api_key = !self.show_api_key;
    }

    pub fn api_key_input_masked(&self) -> bool {
        !self.show_api_key
    }

    pub fn error(&self) -> Option<&DialogError> {
        self.error.as_ref()
    }

    pub fn is_validating(&self) -> bool {
        self.is_validating
    }

    pub fn submit_enabled(&self) -> bool {
        !self.is_validating()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_validating() {
            "Validating..."
        } else {
            "Connect"
        }
    }

    /// Dashboard page listing API keys on the current host
    pub fn api_key_page_url(&self) -> String {
        format!("{}{}", self.host_url, API_KEY_PAGE_PATH)
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.host_url, LOGIN_PATH)
    }

    /// Whether the host URL parses as an http(s) URL with a host. The links
    /// above are built regardless.
    pub fn host_url_is_well_formed(&self) -> bool {
        match Url::parse(self.host_url.trim()) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
            Err(_) => false,
        }
    }

    /// First half of a submit: validate locally, save the host URL and
    /// prepare the request.
    ///
    /// Returns the outcome directly when no request should be sent.
    pub fn begin_submit(&mut self) -> Result<PendingValidation, SubmitOutcome> {
        if self.is_validating {
            return Err(SubmitOutcome::Busy);
        }

        let api_key = self.api_key.trim().to_string();
        if api_key.is_empty() {
            self.error = Some(DialogError::EmptyApiKey);
            return Err(SubmitOutcome::Failed(DialogError::EmptyApiKey));
        }

        self.is_validating = true;
        self.error = None;
        self.closed = false;

        if let Err(e) = self.credentials.save_host_url(&self.host_url) {
            tracing::warn!("Could not save host URL: {}", e);
        }

        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());

        Ok(PendingValidation {
            host_url: self.host_url.clone(),
            api_key,
            cancel,
        })
    }

    /// Second half of a submit: apply the server's answer
    pub fn finish_submit(&mut self, result: ValidationResult) -> SubmitOutcome {
        self.in_flight = None;
        if self.closed {
            tracing::debug!("Ignoring validation result for a closed dialog");
            return SubmitOutcome::Cancelled;
        }
        self.is_validating = false;

        let response = match result.outcome {
            ValidationOutcome::Cancelled => return SubmitOutcome::Cancelled,
            ValidationOutcome::Transport(e) => {
                tracing::error!("Validation error: {}", e);
                return self.fail(DialogError::Connection);
            }
            ValidationOutcome::Response(response) => response,
        };

        match response.class() {
            ResponseClass::Accepted => self.accept(result.api_key, response.body.as_deref()),
            ResponseClass::InvalidCredentials => self.fail(DialogError::InvalidApiKey),
            ResponseClass::ServerError(status) => self.fail(DialogError::Server(status.as_u16())),
        }
    }

    /// Run a whole submit: local checks, request, result
    pub async fn submit<E: ChartEndpoint + ?Sized>(&mut self, endpoint: &E) -> SubmitOutcome {
        let pending = match self.begin_submit() {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = pending.run(endpoint).await;
        self.finish_submit(result)
    }

    /// Dismiss the dialog, abandoning any in-flight validation
    pub fn close(&mut self) {
        if let Some(cancel) = self.in_flight.take() {
            cancel.cancel();
        }
        self.closed = true;
        self.is_validating = false;
        let _ = self.event_tx.send(DialogEvent::Closed);
    }

    fn accept(&mut self, api_key: String, body: Option<&str>) -> SubmitOutcome {
        if let Err(e) = self.credentials.save_api_key(&api_key) {
            tracing::error!("Could not save API key: {}", e);
            return self.fail(DialogError::Storage(e.to_string()));
        }

        match body.map(PreferenceBag::from_response_body) {
            Some(Ok(Some(prefs))) => {
                self.credentials.hydrate_preferences(&prefs);
            }
            Some(Ok(None)) => tracing::debug!("Validation response carried no preferences"),
            Some(Err(e)) => {
                tracing::warn!("Could not parse preferences, cloud sync will handle it: {}", e)
            }
            None => tracing::warn!("Validation response body unavailable, cloud sync will handle it"),
        }

        tracing::info!("API key validated");
        let _ = self.event_tx.send(DialogEvent::Saved {
            api_key: api_key.clone(),
        });
        SubmitOutcome::Connected(api_key)
    }

    fn fail(&mut self, error: DialogError) -> SubmitOutcome {
        self.error = Some(error.clone());
        SubmitOutcome::Failed(error)
    }
}
