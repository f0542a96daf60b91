use chrono::TimeZone;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::timestamp::Timestamp;

/// Placeholder shown wherever a value is missing or unreadable.
pub const NOT_AVAILABLE: &str = "N/A";

/// Display layout for `createdAt`, e.g. `Oct 18, 2026, 03:04 PM`.
pub const CREATED_DISPLAY_FORMAT: &str = "%b %-d, %Y, %I:%M %p";

/// Legacy spellings of the phone field, checked in order after `PhoneNumber`.
///
/// Older builds of the mobile app wrote the number under several names. Every
/// entry contains `phone`, `mobile` or `tel`; a field outside this list is not
/// considered a phone number.
pub const PHONE_FIELD_ALIASES: &[&str] = &[
    "phoneNumber",
    "phone_number",
    "Phone_Number",
    "Phone",
    "phone",
    "PhoneNo",
    "phoneNo",
    "MobileNumber",
    "mobileNumber",
    "Mobile_Number",
    "mobile_number",
    "MobileNo",
    "mobileNo",
    "Mobile",
    "mobile",
    "CellPhone",
    "cellphone",
    "Telephone",
    "telephone",
    "TelephoneNumber",
    "Tel",
    "tel",
];

/// Profile attributes of one registered user, as written by the mobile app.
///
/// Every attribute is optional. Strings are kept as-is, numbers and booleans
/// are stringified, anything else is treated as absent. Fields that are not
/// modelled here are kept in `extra` so legacy phone aliases can be resolved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(
        rename = "FirstName",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_name: Option<String>,

    #[serde(
        rename = "LastName",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<String>,

    #[serde(
        rename = "Address",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,

    #[serde(
        rename = "Barangay",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub barangay: Option<String>,

    #[serde(
        rename = "City",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<String>,

    #[serde(
        rename = "Province",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub province: Option<String>,

    #[serde(
        rename = "Region",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,

    #[serde(
        rename = "PhoneNumber",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone_number: Option<String>,

    #[serde(
        rename = "Email",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Timestamp::is_unknown")]
    pub created_at: Timestamp,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One entry of the `users` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Key assigned by the database; used for lookups only, never displayed.
    pub uid: String,
    pub data: UserData,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

/// `Some(value)` only when the value is present and not blank.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// The value itself, or `"N/A"` when missing or blank.
pub fn or_not_available(value: Option<&str>) -> &str {
    present(value).unwrap_or(NOT_AVAILABLE)
}

impl UserData {
    /// Build from whatever JSON sits under a user key. A value that is not an
    /// object yields an empty record.
    pub fn from_value(uid: &str, value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("User {uid} has unreadable fields, treating as empty: {e}");
                UserData::default()
            }),
            Value::Null => UserData::default(),
            other => {
                warn!("User {uid} is not an object ({other}), treating as empty");
                UserData::default()
            }
        }
    }

    /// Non-blank string stored under a field that is not modelled directly.
    pub fn extra_text(&self, field: &str) -> Option<&str> {
        match self.extra.get(field) {
            Some(Value::String(text)) => present(Some(text.as_str())),
            _ => None,
        }
    }

    /// Canonical `PhoneNumber`, else the first non-blank legacy alias.
    pub fn phone(&self) -> Option<&str> {
        present(self.phone_number.as_deref()).or_else(|| {
            PHONE_FIELD_ALIASES
                .iter()
                .find_map(|alias| self.extra_text(alias))
        })
    }
}

impl UserRecord {
    pub fn new(uid: impl Into<String>, data: UserData) -> Self {
        UserRecord {
            uid: uid.into(),
            data,
        }
    }

    /// Convert the value stored under the collection path into records.
    ///
    /// `null` (an empty collection) and non-object values produce an empty
    /// list. Order follows the map's key order; callers sort afterwards.
    pub fn collection_from_value(value: Value) -> Vec<UserRecord> {
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(uid, data)| {
                    let data = UserData::from_value(&uid, data);
                    UserRecord { uid, data }
                })
                .collect(),
            Value::Null => Vec::new(),
            other => {
                warn!("User collection is not an object ({other}), treating as empty");
                Vec::new()
            }
        }
    }

    pub fn created_at(&self) -> Timestamp {
        self.data.created_at
    }

    /// First and last name joined and trimmed, or `"N/A"`.
    pub fn full_name(&self) -> String {
        let first = self.data.first_name.as_deref().unwrap_or("");
        let last = self.data.last_name.as_deref().unwrap_or("");
        let joined = format!("{first} {last}");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Address, barangay, city, province and region joined by `", "`,
    /// skipping blanks, or `"N/A"`.
    pub fn full_address(&self) -> String {
        let parts: Vec<&str> = [
            &self.data.address,
            &self.data.barangay,
            &self.data.city,
            &self.data.province,
            &self.data.region,
        ]
        .into_iter()
        .filter_map(|part| present(part.as_deref()))
        .collect();

        if parts.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            parts.join(", ")
        }
    }

    pub fn phone_number(&self) -> &str {
        self.data.phone().unwrap_or(NOT_AVAILABLE)
    }

    pub fn email(&self) -> &str {
        or_not_available(self.data.email.as_deref())
    }

    pub fn address(&self) -> &str {
        or_not_available(self.data.address.as_deref())
    }

    pub fn barangay(&self) -> &str {
        or_not_available(self.data.barangay.as_deref())
    }

    pub fn city(&self) -> &str {
        or_not_available(self.data.city.as_deref())
    }

    pub fn province(&self) -> &str {
        or_not_available(self.data.province.as_deref())
    }

    pub fn region(&self) -> &str {
        or_not_available(self.data.region.as_deref())
    }

    /// `createdAt` as shown in tables and exports, or `"N/A"`.
    pub fn created_display<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.data.created_at.format_in(tz, CREATED_DISPLAY_FORMAT)
    }
}

/// Newest first; unknown creation times go last. Stable for equal times.
pub fn sort_newest_first(users: &mut [UserRecord]) {
    users.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}
