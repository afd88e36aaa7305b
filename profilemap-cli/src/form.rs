use clap::Args;
use dialoguer::Input;
use profilemap_lib::{Profile, ProfileInput, StoreError, ValidationError, ValidationPolicy};
use std::io;
use tracing::warn;

/// Profile form fields that can be given on the command line.
#[derive(Args, Debug, Default)]
pub struct ProfileFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_name = "URL")]
    pub photo: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<String>,

    /// Human-readable location label
    #[arg(long = "address", value_name = "ADDRESS")]
    pub formatted: Option<String>,

    #[arg(long)]
    pub contact: Option<String>,

    /// Comma separated
    #[arg(long)]
    pub interests: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    Name,
    Photo,
    Description,
    Lat,
    Lng,
    Formatted,
    Contact,
    Interests,
}

impl Field {
    const ALL: [Field; 8] = [
        Field::Name,
        Field::Photo,
        Field::Description,
        Field::Lat,
        Field::Lng,
        Field::Formatted,
        Field::Contact,
        Field::Interests,
    ];

    fn prompt(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Photo => "Photo URL",
            Field::Description => "Description",
            Field::Lat => "Latitude",
            Field::Lng => "Longitude",
            Field::Formatted => "Formatted Address",
            Field::Contact => "Contact Email",
            Field::Interests => "Interests (comma separated)",
        }
    }

    fn required_by(self, policy: ValidationPolicy) -> bool {
        match self {
            Field::Name | Field::Photo | Field::Lat | Field::Lng => true,
            Field::Description | Field::Formatted | Field::Contact => {
                policy == ValidationPolicy::Strict
            }
            Field::Interests => false,
        }
    }
}

impl From<ValidationError> for Field {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::NameRequired => Field::Name,
            ValidationError::PhotoRequired => Field::Photo,
            ValidationError::DescriptionRequired => Field::Description,
            ValidationError::InvalidLatitude => Field::Lat,
            ValidationError::InvalidLongitude => Field::Lng,
            ValidationError::FormattedAddressRequired => Field::Formatted,
            ValidationError::ContactRequired => Field::Contact,
        }
    }
}

/// Asks the user for one field value.
pub trait Prompt {
    fn ask(&mut self, label: &str, initial: &str) -> io::Result<String>;
}

pub struct TerminalPrompt;

impl TerminalPrompt {
    /// A terminal prompt when `enabled`, otherwise none.
    pub fn boxed(enabled: bool) -> Option<Box<dyn Prompt>> {
        enabled.then(|| Box::new(TerminalPrompt) as Box<dyn Prompt>)
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, label: &str, initial: &str) -> io::Result<String> {
        Input::new()
            .with_prompt(label)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
    }
}

/// A profile form being filled in from flags and, when a prompt is given, the user.
pub struct Form {
    pub input: ProfileInput,
    pub policy: ValidationPolicy,
    prompt: Option<Box<dyn Prompt>>,
}

impl Form {
    pub fn new(policy: ValidationPolicy, prompt: Option<Box<dyn Prompt>>) -> Self {
        Self::prefilled(ProfileInput::default(), policy, prompt)
    }

    /// Start from an existing record, as when editing.
    pub fn editing(
        profile: &Profile,
        policy: ValidationPolicy,
        prompt: Option<Box<dyn Prompt>>,
    ) -> Self {
        Self::prefilled(ProfileInput::from(profile), policy, prompt)
    }

    fn prefilled(
        input: ProfileInput,
        policy: ValidationPolicy,
        prompt: Option<Box<dyn Prompt>>,
    ) -> Self {
        Self {
            input,
            policy,
            prompt,
        }
    }

    /// Overwrite fields with whatever was passed on the command line.
    pub fn apply(&mut self, fields: ProfileFields) {
        let input = &mut self.input;
        if let Some(name) = fields.name {
            input.name = name;
        }
        if let Some(photo) = fields.photo {
            input.photo = photo;
        }
        if let Some(lat) = fields.lat {
            input.lat = lat;
        }
        if let Some(lng) = fields.lng {
            input.lng = lng;
        }
        input.description = fields.description.or(input.description.take());
        input.formatted = fields.formatted.or(input.formatted.take());
        input.contact = fields.contact.or(input.contact.take());
        input.interests = fields.interests.or(input.interests.take());
    }

    /// Prompt for every field the policy requires that is still blank.
    pub fn complete(&mut self) -> anyhow::Result<()> {
        if self.prompt.is_none() {
            return Ok(());
        }
        for field in Field::ALL {
            if field.required_by(self.policy) && self.value(field).trim().is_empty() {
                self.ask(field)?;
            }
        }
        Ok(())
    }

    /// Run `submit` until it succeeds, re-asking for the offending field after
    /// each validation failure. Without prompts the first failure is returned.
    /// A prompt that fails ends the loop with the prompt's error.
    pub fn submit<T, F>(&mut self, mut submit: F) -> anyhow::Result<T>
    where
        F: FnMut(&ProfileInput, ValidationPolicy) -> Result<T, StoreError>,
    {
        loop {
            match submit(&self.input, self.policy) {
                Err(StoreError::Validation(e)) if self.prompt.is_some() => {
                    eprintln!("{e}");
                    if let Err(prompt_error) = self.ask(Field::from(e)) {
                        warn!("Gave up on the form after \"{e}\": {prompt_error}");
                        return Err(prompt_error);
                    }
                }
                result => return Ok(result?),
            }
        }
    }

    fn value(&self, field: Field) -> &str {
        let input = &self.input;
        match field {
            Field::Name => &input.name,
            Field::Photo => &input.photo,
            Field::Lat => &input.lat,
            Field::Lng => &input.lng,
            Field::Description => input.description.as_deref().unwrap_or_default(),
            Field::Formatted => input.formatted.as_deref().unwrap_or_default(),
            Field::Contact => input.contact.as_deref().unwrap_or_default(),
            Field::Interests => input.interests.as_deref().unwrap_or_default(),
        }
    }

    fn set(&mut self, field: Field, value: String) {
        let input = &mut self.input;
        match field {
            Field::Name => input.name = value,
            Field::Photo => input.photo = value,
            Field::Lat => input.lat = value,
            Field::Lng => input.lng = value,
            Field::Description => input.description = Some(value),
            Field::Formatted => input.formatted = Some(value),
            Field::Contact => input.contact = Some(value),
            Field::Interests => input.interests = Some(value),
        }
    }

    fn ask(&mut self, field: Field) -> anyhow::Result<()> {
        let initial = self.value(field).to_string();
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        let value = prompt.ask(field.prompt(), &initial)?;
        self.set(field, value);
        Ok(())
    }
}
