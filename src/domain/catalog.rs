//! Location catalog: governorates (cities) and their regions.
//!
//! Built once at startup and never mutated. Region ids are scoped to their
//! city, so every lookup takes the city id as well.

use crate::domain::entities::{CityId, RegionId};
use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub regions: Vec<Region>,
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct LocationCatalog {
    version: String,
    cities: BTreeMap<CityId, City>,
    /// Region ids are display-only, not the codes the model was trained on.
    placeholder_region_codes: bool,
}

impl LocationCatalog {
    /// Build a catalog, rejecting duplicate city ids and duplicate region ids
    /// within a city. The same region id under two different cities is fine.
    pub fn new(version: impl Into<String>, cities: Vec<City>) -> Result<Self, DomainError> {
        let mut map = BTreeMap::new();
        for city in cities {
            let mut seen = HashSet::new();
            for region in &city.regions {
                if !seen.insert(region.id) {
                    return Err(DomainError::Catalog(format!(
                        "duplicate region id {} in city {} ({})",
                        region.id, city.id, city.name
                    )));
                }
            }
            let id = city.id;
            if map.insert(id, city).is_some() {
                return Err(DomainError::Catalog(format!("duplicate city id {}", id)));
            }
        }
        Ok(Self {
            version: version.into(),
            cities: map,
            placeholder_region_codes: false,
        })
    }

    pub fn with_placeholder_region_codes(mut self, placeholder: bool) -> Self {
        self.placeholder_region_codes = placeholder;
        self
    }

    /// True when region ids must not be trusted as model inputs.
    pub fn has_placeholder_region_codes(&self) -> bool {
        self.placeholder_region_codes
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Cities in id order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    pub fn city(&self, city_id: CityId) -> Option<&City> {
        self.cities.get(&city_id)
    }

    /// Ordered regions of a city. Unknown city yields an empty slice, never an error:
    /// callers may ask before a city is chosen.
    pub fn regions_for(&self, city_id: CityId) -> &[Region] {
        self.cities
            .get(&city_id)
            .map(|c| c.regions.as_slice())
            .unwrap_or(&[])
    }

    pub fn region(&self, city_id: CityId, region_id: RegionId) -> Option<&Region> {
        self.regions_for(city_id).iter().find(|r| r.id == region_id)
    }

    pub fn contains_region(&self, city_id: CityId, region_id: RegionId) -> bool {
        self.region(city_id, region_id).is_some()
    }

    /// Case-insensitive substring match on city names. Empty query returns all.
    pub fn search_cities(&self, query: &str) -> Vec<&City> {
        let needle = query.trim().to_lowercase();
        self.cities
            .values()
            .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Case-insensitive substring match on the regions of one city.
    pub fn search_regions(&self, city_id: CityId, query: &str) -> Vec<&Region> {
        let needle = query.trim().to_lowercase();
        self.regions_for(city_id)
            .iter()
            .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: RegionId, name: &str) -> Region {
        Region {
            id,
            name: name.to_string(),
        }
    }

    fn sample() -> LocationCatalog {
        LocationCatalog::new(
            "test",
            vec![
                City {
                    id: 19,
                    name: "Sousse".into(),
                    regions: vec![region(0, "Akouda"), region(1, "Hammam Sousse")],
                },
                City {
                    id: 22,
                    name: "Tunis".into(),
                    regions: vec![region(0, "Bab El Bhar"), region(1, "La Marsa")],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn unknown_city_has_no_regions() {
        let catalog = sample();
        assert!(catalog.regions_for(3).is_empty());
        assert!(catalog.regions_for(CityId::MAX).is_empty());
        assert!(catalog.region(3, 0).is_none());
    }

    #[test]
    fn region_ids_are_scoped_to_city() {
        let catalog = sample();
        assert_eq!(catalog.region(22, 1).unwrap().name, "La Marsa");
        assert_eq!(catalog.region(19, 1).unwrap().name, "Hammam Sousse");
        assert!(!catalog.contains_region(22, 2));
    }

    #[test]
    fn rejects_duplicates() {
        let dup_region = LocationCatalog::new(
            "bad",
            vec![City {
                id: 1,
                name: "X".into(),
                regions: vec![region(0, "a"), region(0, "b")],
            }],
        );
        assert!(matches!(dup_region, Err(DomainError::Catalog(_))));

        let city = City {
            id: 1,
            name: "X".into(),
            regions: vec![],
        };
        let dup_city = LocationCatalog::new("bad", vec![city.clone(), city]);
        assert!(matches!(dup_city, Err(DomainError::Catalog(_))));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let catalog = sample();
        let hits: Vec<_> = catalog.search_cities("SOU").iter().map(|c| c.id).collect();
        assert_eq!(hits, vec![19]);
        assert_eq!(catalog.search_cities("  ").len(), 2);
        let regions = catalog.search_regions(22, "marsa");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, 1);
        assert!(catalog.search_regions(5, "").is_empty());
    }
}
