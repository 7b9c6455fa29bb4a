//! Value Objects for the shop

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ShopError;

pub const MAX_SLUG_LEN: usize = 50;

/// URL-safe unique handle for categories and products
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into().trim().to_lowercase();
        if value.is_empty() { return Err(SlugError::Empty); }
        if value.len() > MAX_SLUG_LEN { return Err(SlugError::TooLong); }
        if let Some(c) = value.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_')) {
            return Err(SlugError::InvalidChar(c));
        }
        Ok(Self(value))
    }

    /// Derives a slug from a display name: "Kitchen & Dining" -> "kitchen-dining".
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.trim().to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-');
        Self::new(slug.chars().take(MAX_SLUG_LEN).collect::<String>().trim_end_matches('-'))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("slug is empty")]
    Empty,
    #[error("slug is longer than {MAX_SLUG_LEN} characters")]
    TooLong,
    #[error("slug contains invalid character {0:?}")]
    InvalidChar(char),
}

impl From<SlugError> for ShopError {
    fn from(err: SlugError) -> Self { ShopError::Validation(err.to_string()) }
}

/// Non-negative amount with two decimal places
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    pub const SCALE: u32 = 2;
    /// Largest amount a `NUMERIC(10, 2)` column holds.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(PriceError::Negative); }
        if amount > Self::MAX { return Err(PriceError::TooLarge); }
        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE { return Err(PriceError::TooPrecise); }
        let mut amount = normalized;
        amount.rescale(Self::SCALE);
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal { self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must not be negative")]
    Negative,
    #[error("price supports at most two decimal places")]
    TooPrecise,
    #[error("price must not exceed 99999999.99")]
    TooLarge,
}

impl From<PriceError> for ShopError {
    fn from(err: PriceError) -> Self { ShopError::Validation(err.to_string()) }
}

/// Positive item count that fits the store's 32-bit column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: i64) -> Result<Self, ShopError> {
        if value < 1 {
            return Err(ShopError::InvalidQuantity(format!("{value} is not a positive integer")));
        }
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or_else(|| ShopError::InvalidQuantity(format!("{value} exceeds {}", Self::MAX)))
    }

    /// Request input where an absent quantity is as invalid as zero.
    pub fn from_input(value: Option<i64>) -> Result<Self, ShopError> {
        value
            .ok_or_else(|| ShopError::InvalidQuantity("quantity is required".to_string()))
            .and_then(Self::new)
    }

    pub fn as_i32(&self) -> i32 {
        // bounded by MAX in the constructor
        self.0 as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(Slug::new(" Garden-Tools ").unwrap().as_str(), "garden-tools");
        assert_eq!(Slug::new("a b"), Err(SlugError::InvalidChar(' ')));
        assert_eq!(Slug::new(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_slug_from_name() {
        assert_eq!(Slug::from_name("Kitchen & Dining").unwrap().as_str(), "kitchen-dining");
        assert_eq!(Slug::from_name("  Shoes!  ").unwrap().as_str(), "shoes");
        assert!(Slug::from_name("!!!").is_err());
        assert_eq!(Slug::from_name(&"x".repeat(80)).unwrap().as_str().len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_price() {
        assert_eq!(Price::new(Decimal::new(10, 0)).unwrap().amount().to_string(), "10.00");
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert_eq!(Price::new(Decimal::new(1001, 3)), Err(PriceError::TooPrecise));
        // trailing zeros are not extra precision
        assert!(Price::new(Decimal::new(12500, 3)).is_ok());
    }

    #[test]
    fn test_price_fits_the_price_column() {
        assert_eq!(Price::MAX, Decimal::new(9_999_999_999, 2));
        assert_eq!(Price::new(Price::MAX).unwrap().amount(), Decimal::new(9_999_999_999, 2));
        assert_eq!(Price::new(Decimal::new(1_000_000_000, 0)), Err(PriceError::TooLarge));
        assert_eq!(Price::new(Decimal::new(10_000_000_000, 2)), Err(PriceError::TooLarge));
    }

    #[test]
    fn test_quantity() {
        assert_eq!(Quantity::new(3).unwrap().as_i32(), 3);
        assert!(matches!(Quantity::new(0), Err(ShopError::InvalidQuantity(_))));
        assert!(matches!(Quantity::new(-2), Err(ShopError::InvalidQuantity(_))));
        assert!(matches!(Quantity::new(i64::from(i32::MAX) + 1), Err(ShopError::InvalidQuantity(_))));
        assert!(matches!(Quantity::from_input(None), Err(ShopError::InvalidQuantity(_))));
    }
}
