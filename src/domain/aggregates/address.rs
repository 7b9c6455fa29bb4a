//! Address book entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{Result, ShopError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    #[default]
    Home,
    Office,
    Other,
}

impl AddressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Office => "office",
            Self::Other => "other",
        }
    }
}

impl FromStr for AddressType {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "home" => Ok(Self::Home),
            "office" => Ok(Self::Office),
            "other" => Ok(Self::Other),
            other => Err(ShopError::Validation(format!("unknown address type {other:?}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_type: AddressType,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    pub fn belongs_to(&self, user_id: Uuid) -> bool { self.user_id == user_id }
}

/// Editable address fields.
#[derive(Clone, Debug)]
pub struct AddressFields {
    pub address_type: AddressType,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub is_default: bool,
}
