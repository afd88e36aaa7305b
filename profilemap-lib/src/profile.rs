use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub photo: String,
    #[serde(default)]
    pub description: String,
    pub address: Address,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Address {
    #[serde(serialize_with = "serialize_coordinate")]
    pub lat: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub lng: f64,
    #[serde(default)]
    pub formatted: String,
}

impl Profile {
    /// Case-insensitive substring match on the name. An empty term matches everything.
    pub fn name_contains(&self, term: &str) -> bool {
        term.is_empty() || self.name.to_lowercase().contains(&term.to_lowercase())
    }

    pub fn is_located_at(&self, formatted: &str) -> bool {
        self.address.formatted == formatted
    }
}

fn serialize_coordinate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return serializer.serialize_f64(*value);
    }
    let raw = RawValue::from_string(js_number(*value)).map_err(S::Error::custom)?;
    raw.serialize(serializer)
}

/// Formats a number the way `JSON.stringify` does: shortest round-trip digits,
/// plain decimals for `1e-6 <= |x| < 1e21`, signed exponents outside that range.
fn js_number(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }
    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}
