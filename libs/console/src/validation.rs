//! Contact form field validation
//!
//! Emptiness and length of the name and message are judged on the trimmed
//! value; every pattern is matched against the raw value.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Fields of the contact form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    BusinessType,
    Email,
    Phone,
    Message,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::FullName,
        Field::BusinessType,
        Field::Email,
        Field::Phone,
        Field::Message,
    ];

    /// Form key of the field
    pub fn name(self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::BusinessType => "businessType",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| format!("Unknown form field: {}", s))
    }
}

/// Choices of the business type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessType {
    Supermarket,
    Pharmacy,
    Restaurant,
    Enterprise,
    Other,
}

impl BusinessType {
    pub const ALL: [BusinessType; 5] = [
        BusinessType::Supermarket,
        BusinessType::Pharmacy,
        BusinessType::Restaurant,
        BusinessType::Enterprise,
        BusinessType::Other,
    ];

    pub fn value(self) -> &'static str {
        match self {
            BusinessType::Supermarket => "supermarket",
            BusinessType::Pharmacy => "pharmacy",
            BusinessType::Restaurant => "restaurant",
            BusinessType::Enterprise => "enterprise",
            BusinessType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BusinessType::Supermarket => "Supermarket",
            BusinessType::Pharmacy => "Pharmacy",
            BusinessType::Restaurant => "Restaurant",
            BusinessType::Enterprise => "Enterprise",
            BusinessType::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<BusinessType> {
        BusinessType::ALL
            .into_iter()
            .find(|choice| choice.value() == value)
    }
}

/// Class of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Required,
    TooShort,
    InvalidCharacters,
    InvalidFormat,
}

/// A field-scoped validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Field,
    pub kind: ValidationErrorKind,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: Field, kind: ValidationErrorKind, message: &'static str) -> Self {
        Self {
            field,
            kind,
            message,
        }
    }
}

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z\s]*$").expect("Failed to compile name regex"))
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
            .expect("Failed to compile email regex")
    })
}

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9\s-]{10,}$").expect("Failed to compile phone regex"))
}

/// Length in UTF-16 code units, the unit browsers count in form inputs
fn text_length(value: &str) -> usize {
    value.encode_utf16().count()
}

/// Validate one field value
pub fn validate_field(field: Field, value: &str) -> Result<(), ValidationError> {
    use ValidationErrorKind::*;

    let fail = |kind, message| Err(ValidationError::new(field, kind, message));

    match field {
        Field::FullName => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return fail(Required, "Full name is required");
            }
            if text_length(trimmed) < 3 {
                return fail(TooShort, "Name must be at least 3 characters");
            }
            if !name_regex().is_match(value) {
                return fail(InvalidCharacters, "Name should only contain letters");
            }
        }
        Field::BusinessType => {
            if BusinessType::parse(value).is_none() {
                return fail(Required, "Please select a business type");
            }
        }
        Field::Email => {
            if value.is_empty() {
                return fail(Required, "Email is required");
            }
            if !email_regex().is_match(value) {
                return fail(InvalidFormat, "Please enter a valid email address");
            }
        }
        Field::Phone => {
            if value.is_empty() {
                return fail(Required, "Phone number is required");
            }
            if !phone_regex().is_match(value) {
                return fail(InvalidFormat, "Invalid phone format (min 10 digits)");
            }
        }
        Field::Message => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return fail(Required, "Message is required");
            }
            if text_length(trimmed) < 10 {
                return fail(TooShort, "Message must be at least 10 characters");
            }
        }
    }

    Ok(())
}
