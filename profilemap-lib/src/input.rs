use crate::profile::Profile;

/// Raw form submission for a profile, as typed by a user.
///
/// Required fields are plain strings; a blank value is rejected during
/// validation. Optional fields may be left out entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileInput {
    pub name: String,
    pub photo: String,
    pub lat: String,
    pub lng: String,
    pub description: Option<String>,
    pub formatted: Option<String>,
    pub contact: Option<String>,
    /// Comma separated.
    pub interests: Option<String>,
}

pub type CreateInput = ProfileInput;
pub type UpdateInput = ProfileInput;

impl From<&Profile> for ProfileInput {
    /// Prefill a form from an existing record, as the admin panel does before an edit.
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            photo: profile.photo.clone(),
            lat: profile.address.lat.to_string(),
            lng: profile.address.lng.to_string(),
            description: Some(profile.description.clone()),
            formatted: Some(profile.address.formatted.clone()),
            contact: Some(profile.contact.clone()),
            interests: Some(profile.interests.join(", ")),
        }
    }
}
