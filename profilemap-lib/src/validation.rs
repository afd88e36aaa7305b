//! Form validation for profile submissions.
//!
//! Two strictness levels exist. The public create form only insists on the
//! fields a profile cannot be displayed without, while the admin panel also
//! requires a description, a formatted address and contact details. Rules are
//! checked in form order and the first failing rule is reported.

use crate::input::ProfileInput;
use crate::profile::{Address, Profile};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ValidationPolicy {
    /// Name, photo and coordinates are required.
    #[default]
    Standard,
    /// Additionally requires description, formatted address and contact.
    Strict,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,
    #[error("Photo URL is required")]
    PhotoRequired,
    #[error("Description is required")]
    DescriptionRequired,
    #[error("Valid latitude is required")]
    InvalidLatitude,
    #[error("Valid longitude is required")]
    InvalidLongitude,
    #[error("Formatted address is required")]
    FormattedAddressRequired,
    #[error("Contact info is required")]
    ContactRequired,
}

/// A submission that passed validation, waiting for an id.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedProfile {
    pub name: String,
    pub photo: String,
    pub description: String,
    pub address: Address,
    pub contact: String,
    pub interests: Vec<String>,
}

impl ValidatedProfile {
    pub fn with_id(self, id: String) -> Profile {
        Profile {
            id,
            name: self.name,
            photo: self.photo,
            description: self.description,
            address: self.address,
            contact: self.contact,
            interests: self.interests,
        }
    }
}

/// Validate `input` under `policy` and normalize it into profile fields.
pub fn validate(
    input: &ProfileInput,
    policy: ValidationPolicy,
) -> Result<ValidatedProfile, ValidationError> {
    let strict = policy == ValidationPolicy::Strict;

    let name = required(&input.name, ValidationError::NameRequired)?;
    let photo = required(&input.photo, ValidationError::PhotoRequired)?;
    let description = trimmed(input.description.as_deref());
    if strict && description.is_empty() {
        return Err(ValidationError::DescriptionRequired);
    }
    let lat = parse_coordinate(&input.lat).ok_or(ValidationError::InvalidLatitude)?;
    let lng = parse_coordinate(&input.lng).ok_or(ValidationError::InvalidLongitude)?;
    let formatted = trimmed(input.formatted.as_deref());
    if strict && formatted.is_empty() {
        return Err(ValidationError::FormattedAddressRequired);
    }
    let contact = trimmed(input.contact.as_deref());
    if strict && contact.is_empty() {
        return Err(ValidationError::ContactRequired);
    }

    Ok(ValidatedProfile {
        name,
        photo,
        description,
        address: Address {
            lat,
            lng,
            formatted,
        },
        contact,
        interests: parse_interests(input.interests.as_deref().unwrap_or_default()),
    })
}

/// Split a comma separated list, trimming each entry and dropping empty ones.
///
/// Order is preserved and duplicates are kept.
pub fn parse_interests(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|interest| !interest.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a coordinate typed into a form. Blank, non-numeric and non-finite
/// values are rejected.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn required(value: &str, error: ValidationError) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(error)
    } else {
        Ok(value.to_string())
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}
