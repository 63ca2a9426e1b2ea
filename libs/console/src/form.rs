//! Contact form state and submission control

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::validation::{Field, ValidationError, validate_field};

/// Submission lifecycle of a form instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success,
}

/// One input of the form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub touched: bool,
    pub error: Option<ValidationError>,
}

impl FieldState {
    fn revalidate(&mut self, field: Field) {
        self.error = validate_field(field, &self.value).err();
    }
}

/// Values handed to the submission sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub full_name: String,
    pub business_type: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

/// Why a submit did not start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("{} field(s) need attention", fields.len())]
    Invalid { fields: Vec<Field> },

    #[error("A submission is already in progress")]
    InFlight,

    #[error("The message was already sent")]
    AlreadySent,
}

/// Failure of the external submission call
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{0}")]
    Rejected(String),

    #[error("Could not store the message: {0}")]
    Store(#[from] common::StoreError),
}

/// External receiver of contact submissions
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn submit(&self, submission: &ContactSubmission) -> Result<(), SubmitError>;
}

/// Contact form state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    fields: BTreeMap<Field, FieldState>,
    state: SubmissionState,
    last_error: Option<String>,
}

impl ContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn field(&self, field: Field) -> FieldState {
        self.fields.get(&field).cloned().unwrap_or_default()
    }

    pub fn value(&self, field: Field) -> &str {
        self.fields
            .get(&field)
            .map(|state| state.value.as_str())
            .unwrap_or("")
    }

    /// Error to display: only touched fields show theirs
    pub fn visible_error(&self, field: Field) -> Option<&ValidationError> {
        self.fields
            .get(&field)
            .filter(|state| state.touched)
            .and_then(|state| state.error.as_ref())
    }

    /// Error of the last failed submission, cleared by the next attempt
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Submit trigger availability
    pub fn can_submit(&self) -> bool {
        self.state == SubmissionState::Idle
    }

    /// Keystroke in `field`
    pub fn change(&mut self, field: Field, value: impl Into<String>) {
        if self.state == SubmissionState::Success {
            return;
        }
        let state = self.fields.entry(field).or_default();
        state.value = value.into();
        if state.touched {
            state.revalidate(field);
        }
    }

    /// Focus left `field`
    pub fn blur(&mut self, field: Field) {
        let state = self.fields.entry(field).or_default();
        state.touched = true;
        state.revalidate(field);
    }

    /// Choice made in the business type dropdown
    pub fn select_business_type(&mut self, value: impl Into<String>) {
        self.change(Field::BusinessType, value);
        self.blur(Field::BusinessType);
    }

    /// Validate everything and enter `Submitting` if the form is clean
    ///
    /// On failure every field is marked touched so all problems show at once.
    pub fn begin_submit(&mut self) -> Result<ContactSubmission, SubmitRejected> {
        match self.state {
            SubmissionState::Submitting => return Err(SubmitRejected::InFlight),
            SubmissionState::Success => return Err(SubmitRejected::AlreadySent),
            SubmissionState::Idle => {}
        }

        let mut invalid = Vec::new();
        for field in Field::ALL {
            let state = self.fields.entry(field).or_default();
            state.revalidate(field);
            if state.error.is_some() {
                invalid.push(field);
            }
        }

        if !invalid.is_empty() {
            for state in self.fields.values_mut() {
                state.touched = true;
            }
            return Err(SubmitRejected::Invalid { fields: invalid });
        }

        self.state = SubmissionState::Submitting;
        self.last_error = None;

        Ok(ContactSubmission {
            full_name: self.value(Field::FullName).to_string(),
            business_type: self.value(Field::BusinessType).to_string(),
            email: self.value(Field::Email).to_string(),
            phone: self.value(Field::Phone).to_string(),
            message: self.value(Field::Message).to_string(),
        })
    }

    /// Record the outcome of the external call; values survive a failure
    pub fn finish(&mut self, outcome: Result<(), String>) {
        if self.state != SubmissionState::Submitting {
            return;
        }
        match outcome {
            Ok(()) => self.state = SubmissionState::Success,
            Err(message) => {
                self.state = SubmissionState::Idle;
                self.last_error = Some(message);
            }
        }
    }

    /// "Send another message": back to an empty idle form
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of [`FormController::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Invalid { fields: Vec<Field> },
    Failed { message: String },
    /// The trigger was not available
    Ignored,
}

/// Drives a [`ContactForm`] against a [`LeadSink`]
///
/// The form lock is never held across the external call, so the form stays
/// observable while a submission is in flight.
#[derive(Clone)]
pub struct FormController {
    form: Arc<Mutex<ContactForm>>,
    sink: Arc<dyn LeadSink>,
}

impl FormController {
    pub fn new(sink: Arc<dyn LeadSink>) -> Self {
        Self {
            form: Arc::new(Mutex::new(ContactForm::new())),
            sink,
        }
    }

    pub async fn snapshot(&self) -> ContactForm {
        self.form.lock().await.clone()
    }

    pub async fn change(&self, field: Field, value: impl Into<String>) {
        self.form.lock().await.change(field, value);
    }

    pub async fn blur(&self, field: Field) {
        self.form.lock().await.blur(field);
    }

    pub async fn select_business_type(&self, value: impl Into<String>) {
        self.form.lock().await.select_business_type(value);
    }

    pub async fn send_another(&self) {
        self.form.lock().await.reset();
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let submission = match self.form.lock().await.begin_submit() {
            Ok(submission) => submission,
            Err(SubmitRejected::Invalid { fields }) => {
                info!("Contact form has {} invalid field(s)", fields.len());
                return SubmitOutcome::Invalid { fields };
            }
            Err(rejected) => {
                warn!("Submit ignored: {}", rejected);
                return SubmitOutcome::Ignored;
            }
        };

        let result = self.sink.submit(&submission).await;

        let mut form = self.form.lock().await;
        match result {
            Ok(()) => {
                info!("Contact message sent");
                form.finish(Ok(()));
                SubmitOutcome::Sent
            }
            Err(e) => {
                warn!("Contact submission failed: {}", e);
                let message = e.to_string();
                form.finish(Err(message.clone()));
                SubmitOutcome::Failed { message }
            }
        }
    }
}
