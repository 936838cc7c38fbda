//! Domain entities. Pure data structures for the valuation pipeline.
//!
//! No runtime/IO types here; adapters map into these.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Governorate identifier, as used by the trained model (0..=23).
pub type CityId = u8;

/// Region identifier. Only meaningful together with its owning [`CityId`].
pub type RegionId = u16;

/// Number of columns the frozen model expects.
pub const FEATURE_COUNT: usize = 7;

/// Transaction the user wants a price for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Buy,
    Rent,
}

impl Purpose {
    pub const ALL: [Purpose; 2] = [Purpose::Buy, Purpose::Rent];

    /// Integer code used at training time.
    pub fn code(self) -> u8 {
        match self {
            Purpose::Buy => 0,
            Purpose::Rent => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Purpose::Buy => "Buying",
            Purpose::Rent => "Renting",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Purpose {
    type Err = String;

    /// Accepts `buy`/`rent` (any case) or the training codes `0`/`1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "sale" | "0" => Ok(Purpose::Buy),
            "rent" | "1" => Ok(Purpose::Rent),
            other => Err(format!("unknown purpose '{}'", other)),
        }
    }
}

/// Property category. Codes follow the listing taxonomy the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Apartment,
    OfficeSpace,
    SharedHousing,
    HolidayRental,
    Commercial,
    HouseVilla,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Apartment,
        Category::OfficeSpace,
        Category::SharedHousing,
        Category::HolidayRental,
        Category::Commercial,
        Category::HouseVilla,
    ];

    pub fn code(self) -> u8 {
        match self {
            Category::Apartment => 0,
            Category::OfficeSpace => 1,
            Category::SharedHousing => 2,
            Category::HolidayRental => 3,
            Category::Commercial => 4,
            Category::HouseVilla => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Apartment => "Apartments",
            Category::OfficeSpace => "Offices and open floors",
            Category::SharedHousing => "Shared housing",
            Category::HolidayRental => "Holiday rentals",
            Category::Commercial => "Shops, retail and industrial premises",
            Category::HouseVilla => "Houses and villas",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Category::Apartment => "apartment",
            Category::OfficeSpace => "office_space",
            Category::SharedHousing => "shared_housing",
            Category::HolidayRental => "holiday_rental",
            Category::Commercial => "commercial",
            Category::HouseVilla => "house_villa",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts the training code (`0`..`5`) or the snake_case name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown category code {}", code));
        }
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Finalized, validated property description. Only the wizard produces these
/// for interactive use, so every field already satisfies its step predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInput {
    pub purpose: Purpose,
    pub category: Category,
    pub city_id: CityId,
    pub region_id: RegionId,
    pub room_count: u32,
    pub bathroom_count: u32,
    pub size_sqm: f64,
}

/// Model input row. Column order is fixed by the trained model:
/// `[category, purpose, city, region, log1p(rooms), log1p(bathrooms), log1p(size)]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(values: [f32; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn values(&self) -> [f32; FEATURE_COUNT] {
        self.values
    }
}

/// Price estimate in whole currency units.
///
/// `low`/`high` are a fixed ±10% policy band for unmodeled variance
/// (condition, exact micro-location, renovation); they are not a
/// confidence interval computed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub point_estimate: u64,
    pub low: u64,
    pub high: u64,
    pub price_per_sqm: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_codes_match_training() {
        assert_eq!(Purpose::Buy.code(), 0);
        assert_eq!(Purpose::Rent.code(), 1);
        assert_eq!("RENT".parse::<Purpose>().unwrap(), Purpose::Rent);
        assert_eq!("0".parse::<Purpose>().unwrap(), Purpose::Buy);
        assert!("lease".parse::<Purpose>().is_err());
    }

    #[test]
    fn category_codes_are_dense_and_parseable() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.code() as usize, i);
            assert_eq!(Category::from_code(i as u8), Some(*c));
        }
        assert_eq!(Category::from_code(6), None);
        assert_eq!("house_villa".parse::<Category>().unwrap(), Category::HouseVilla);
        assert_eq!(" 4 ".parse::<Category>().unwrap(), Category::Commercial);
        assert!("9".parse::<Category>().is_err());
    }
}
