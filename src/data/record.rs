//! Listing records as scraped from dealer inventory

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One vehicle inventory entry.
///
/// Field names follow the inventory export (`fuelType` is camel-cased).
/// Categorical fields accept strings or numbers; numbers are kept as their
/// textual form so a model code like `3` is never treated as a quantity.
/// Numeric fields accept numbers or numeric strings; anything unparsable
/// is treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,

    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "number_or_text", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "number_or_text", skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,

    #[serde(
        rename = "fuelType",
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub fuel_type: Option<String>,

    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,

    #[serde(default, deserialize_with = "number_or_text", skip_serializing_if = "Option::is_none")]
    pub year: Option<f64>,

    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,

    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Inventory lifecycle status (`active`, `removed`)
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// First sync that saw this VIN
    #[serde(default, deserialize_with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,

    /// Latest sync whose scrape contained this VIN
    #[serde(default, deserialize_with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<DateTime<Utc>>,

    /// Every other scraped field, carried through untouched
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ListingRecord {
    /// Create a record keyed by `vin`
    pub fn new(vin: impl Into<String>) -> Self {
        Self {
            vin: Some(vin.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_mileage(mut self, mileage: f64) -> Self {
        self.mileage = Some(mileage);
        self
    }

    pub fn with_fuel_type(mut self, fuel_type: impl Into<String>) -> Self {
        self.fuel_type = Some(fuel_type.into());
        self
    }

    pub fn with_transmission(mut self, transmission: impl Into<String>) -> Self {
        self.transmission = Some(transmission.into());
        self
    }

    pub fn with_year(mut self, year: f64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_make(mut self, make: impl Into<String>) -> Self {
        self.make = Some(make.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn number_or_text<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}

/// RFC 3339, or a naive ISO timestamp read as UTC; anything else is missing
fn timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|t| t.and_utc())
            }),
        _ => None,
    })
}
