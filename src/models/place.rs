// src/models/place.rs
// DOCUMENTATION: Core data structures for places
// PURPOSE: Geocoded place records and their address components

use serde::{Deserialize, Serialize};

use super::{PlaceId, Point};

/// Component type marking the country entry of an address
pub const COUNTRY_TYPE: &str = "country";

/// One component of a geocoded address
/// DOCUMENTATION: Mirrors the geocoder's component shape, e.g.
/// {long_name: "Spain", short_name: "ES", types: ["country", "political"]}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,

    /// Component classification; treated as a set, order is not significant
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn new(
        long_name: impl Into<String>,
        short_name: impl Into<String>,
        types: &[&str],
    ) -> Self {
        Self {
            long_name: long_name.into(),
            short_name: short_name.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }

    pub fn is_country(&self) -> bool {
        self.has_type(COUNTRY_TYPE)
    }
}

/// Geometry block of a place document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaceGeometry {
    pub geolocation: Point,
}

/// Represents a complete place record
/// DOCUMENTATION: Every place has exactly one location; address components may be empty.
/// Serialized as {_id, formatted_address, address_components, geometry: {geolocation}}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "_id")]
    pub id: PlaceId,

    pub formatted_address: String,

    #[serde(default)]
    pub address_components: Vec<AddressComponent>,

    pub geometry: PlaceGeometry,
}

impl Place {
    pub fn location(&self) -> Point {
        self.geometry.geolocation
    }

    /// True if any component has exactly this short name
    pub fn has_short_name(&self, name: &str) -> bool {
        self.address_components.iter().any(|c| c.short_name == name)
    }

    /// Country components of this place (normally at most one)
    pub fn countries(&self) -> impl Iterator<Item = &AddressComponent> {
        self.address_components.iter().filter(|c| c.is_country())
    }

    /// True if a country component carries this short code
    pub fn in_country(&self, code: &str) -> bool {
        self.countries().any(|c| c.short_name == code)
    }
}

impl From<&Place> for PlaceId {
    fn from(place: &Place) -> Self {
        place.id
    }
}

/// Place document accepted on insert and bulk load
/// DOCUMENTATION: Same shape as `Place` without the id; an incoming `_id` is ignored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlace {
    #[serde(default)]
    pub formatted_address: String,

    #[serde(default)]
    pub address_components: Vec<AddressComponent>,

    pub geometry: PlaceGeometry,
}

impl NewPlace {
    pub fn new(formatted_address: impl Into<String>, location: Point) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            address_components: Vec::new(),
            geometry: PlaceGeometry {
                geolocation: location,
            },
        }
    }

    pub fn with_component(mut self, component: AddressComponent) -> Self {
        self.address_components.push(component);
        self
    }

    pub fn location(&self) -> Point {
        self.geometry.geolocation
    }

    pub fn into_place(self, id: PlaceId) -> Place {
        Place {
            id,
            formatted_address: self.formatted_address,
            address_components: self.address_components,
            geometry: self.geometry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn zaragoza() -> NewPlace {
        NewPlace::new(
            "Plaza del Pilar, 50003 Zaragoza, Spain",
            Point::new(-0.8773, 41.6561).unwrap(),
        )
        .with_component(AddressComponent::new("Zaragoza", "Zaragoza", &["locality", "political"]))
        .with_component(AddressComponent::new("Spain", "ES", &["country", "political"]))
    }

    #[test]
    fn test_country_lookup() {
        let place = zaragoza().into_place(PlaceId::new());
        assert!(place.in_country("ES"));
        assert!(!place.in_country("FR"));
        assert!(place.has_short_name("Zaragoza"));
        assert_eq!(place.countries().count(), 1);
    }

    #[test]
    fn test_document_shape() {
        let id = PlaceId::new();
        let place = zaragoza().into_place(id);
        let value = serde_json::to_value(&place).unwrap();

        assert_eq!(value["_id"], json!(id.to_string()));
        assert_eq!(value["geometry"]["geolocation"]["type"], json!("Point"));
        assert_eq!(value["address_components"][1]["short_name"], json!("ES"));
    }

    #[test]
    fn test_new_place_ignores_incoming_id() {
        let doc = json!({
            "_id": {"$oid": "56b1ae7b1f2ea0a4c3b2a5a6"},
            "formatted_address": "Baltimore, MD, USA",
            "address_components": [
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
            ],
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-76.6122, 39.2904]}}
        });

        let place: NewPlace = serde_json::from_value(doc).unwrap();
        assert_eq!(place.formatted_address, "Baltimore, MD, USA");
        assert_eq!(place.location(), Point::new(-76.6122, 39.2904).unwrap());
    }
}
