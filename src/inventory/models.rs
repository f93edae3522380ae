//! Site and tree records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::bad_request("Coordinates out of range"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteStatus::Active => write!(f, "active"),
            SiteStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for SiteStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(SiteStatus::Active),
            "inactive" => Ok(SiteStatus::Inactive),
            other => Err(format!("unknown site status '{}'", other)),
        }
    }
}

/// A managed physical location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub image: Option<String>,
    pub coordinates: Coordinates,
    pub status: SiteStatus,
    #[serde(rename = "type")]
    pub site_type: Option<String>,
    pub team_members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /admin/sites/add`
#[derive(Debug, Clone, Deserialize)]
pub struct NewSite {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub image: Option<String>,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub status: SiteStatus,
    #[serde(rename = "type", default)]
    pub site_type: Option<String>,
}

impl NewSite {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::bad_request("Site name is required"));
        }
        if self.address.trim().is_empty() {
            return Err(Error::bad_request("Site address is required"));
        }
        self.coordinates.validate()
    }

    pub fn into_site(self) -> Site {
        let now = Utc::now();
        Site {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            image: self.image,
            coordinates: self.coordinates,
            status: self.status,
            site_type: self.site_type,
            team_members: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeImage {
    pub url: String,
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
}

pub const DEFAULT_TREE_STATUS: &str = "healthy";

/// A planted tree recorded by a team member
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub id: Uuid,
    pub site_id: Uuid,
    pub planted_by: Uuid,
    pub tree_name: String,
    pub coordinates: Coordinates,
    pub date_planted: DateTime<Utc>,
    pub status: String,
    pub remarks: Option<String>,
    pub verified: bool,
    pub images: Vec<TreeImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /user/site/dashboard/add`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTree {
    pub site_id: Uuid,
    pub tree_name: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub date_planted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub images: Vec<TreeImage>,
}

impl NewTree {
    pub fn validate(&self) -> Result<()> {
        if self.tree_name.trim().is_empty() {
            return Err(Error::bad_request("Tree name is required"));
        }
        self.coordinates.validate()
    }

    pub fn into_tree(self, planted_by: Uuid) -> Tree {
        let now = Utc::now();
        Tree {
            id: Uuid::new_v4(),
            site_id: self.site_id,
            planted_by,
            tree_name: self.tree_name.trim().to_string(),
            coordinates: self.coordinates,
            date_planted: self.date_planted.unwrap_or(now),
            status: self
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TREE_STATUS.to_string()),
            remarks: self.remarks,
            verified: false,
            images: self.images,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Changes a planter may make to their tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeUpdate {
    pub tree_name: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub status: Option<String>,
    pub remarks: Option<String>,
    /// Appended to the existing images
    #[serde(default)]
    pub images: Vec<TreeImage>,
}

impl TreeUpdate {
    pub fn is_empty(&self) -> bool {
        self.tree_name.is_none()
            && self.coordinates.is_none()
            && self.status.is_none()
            && self.remarks.is_none()
            && self.images.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::bad_request(
                "At least one field must be provided to update",
            ));
        }
        if matches!(&self.tree_name, Some(name) if name.trim().is_empty()) {
            return Err(Error::bad_request("Tree name cannot be empty"));
        }
        if let Some(coordinates) = &self.coordinates {
            coordinates.validate()?;
        }
        Ok(())
    }

    pub fn apply(&self, tree: &mut Tree) {
        if let Some(name) = &self.tree_name {
            tree.tree_name = name.trim().to_string();
        }
        if let Some(coordinates) = self.coordinates {
            tree.coordinates = coordinates;
        }
        if let Some(status) = &self.status {
            tree.status = status.clone();
        }
        if let Some(remarks) = &self.remarks {
            tree.remarks = Some(remarks.clone());
        }
        tree.images.extend(self.images.iter().cloned());
        tree.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> Coordinates {
        Coordinates {
            lat: 12.97,
            lng: 77.59,
        }
    }

    #[test]
    fn test_coordinates_range() {
        assert!(coords().validate().is_ok());
        assert!(Coordinates { lat: 91.0, lng: 0.0 }.validate().is_err());
        assert!(Coordinates { lat: 0.0, lng: -181.0 }.validate().is_err());
    }

    #[test]
    fn test_new_site_defaults() {
        let site: NewSite = serde_json::from_value(serde_json::json!({
            "name": "North Ridge",
            "address": "Ridge Road",
            "coordinates": { "lat": 12.97, "lng": 77.59 },
            "type": "forest"
        }))
        .unwrap();
        assert!(site.validate().is_ok());

        let site = site.into_site();
        assert_eq!(site.status, SiteStatus::Active);
        assert_eq!(site.site_type.as_deref(), Some("forest"));
        assert!(site.team_members.is_empty());
    }

    #[test]
    fn test_new_site_requires_address() {
        let site = NewSite {
            name: "North Ridge".to_string(),
            address: "  ".to_string(),
            image: None,
            coordinates: coords(),
            status: SiteStatus::Active,
            site_type: None,
        };
        assert!(site.validate().is_err());
    }

    #[test]
    fn test_new_tree_defaults() {
        let planter = Uuid::new_v4();
        let tree = NewTree {
            site_id: Uuid::new_v4(),
            tree_name: " Neem ".to_string(),
            coordinates: coords(),
            date_planted: None,
            status: None,
            remarks: None,
            images: Vec::new(),
        }
        .into_tree(planter);

        assert_eq!(tree.tree_name, "Neem");
        assert_eq!(tree.status, DEFAULT_TREE_STATUS);
        assert_eq!(tree.planted_by, planter);
        assert!(!tree.verified);
    }

    #[test]
    fn test_tree_update() {
        assert!(TreeUpdate::default().validate().is_err());

        let mut tree = NewTree {
            site_id: Uuid::new_v4(),
            tree_name: "Neem".to_string(),
            coordinates: coords(),
            date_planted: None,
            status: None,
            remarks: None,
            images: vec![TreeImage {
                url: "https://img/1.jpg".to_string(),
                timestamp: Utc::now(),
            }],
        }
        .into_tree(Uuid::new_v4());

        let update = TreeUpdate {
            status: Some("wilting".to_string()),
            images: vec![TreeImage {
                url: "https://img/2.jpg".to_string(),
                timestamp: Utc::now(),
            }],
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        update.apply(&mut tree);

        assert_eq!(tree.status, "wilting");
        assert_eq!(tree.images.len(), 2);
        assert_eq!(tree.tree_name, "Neem");
    }
}
