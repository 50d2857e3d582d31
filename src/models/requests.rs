use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::domain::GeoPoint;

/// Caller-supplied description of a business to register
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct BusinessProfileInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub sector: String,
    #[validate(length(min = 1, max = 300))]
    pub address: String,
    #[validate(url)]
    #[serde(default)]
    pub website: Option<String>,
    #[validate(url)]
    #[serde(alias = "business_listing_url", rename = "businessListingUrl", default)]
    pub business_listing_url: Option<String>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

impl BusinessProfileInput {
    pub fn new(name: impl Into<String>, sector: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sector: sector.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_listing_url(mut self, url: impl Into<String>) -> Self {
        self.business_listing_url = Some(url.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(GeoPoint::new(latitude, longitude));
        self
    }

    /// Trim text fields; blank optional fields become absent
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.sector = self.sector.trim().to_string();
        self.address = self.address.trim().to_string();
        self.website = blank_to_none(self.website);
        self.business_listing_url = blank_to_none(self.business_listing_url);
        self
    }

    /// Derived validation plus the coordinate range check
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let Some(point) = &self.coordinates {
            if !point.is_valid() {
                errors.add("coordinates", ValidationError::new("range"));
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
