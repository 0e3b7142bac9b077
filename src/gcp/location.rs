//! Locations and scopes
//!
//! A [`LocationInfo`] addresses a project, optionally narrowed to a region or
//! a zone. Its scope string (`project`, `project.region`, `project.zone`) is
//! used both to build API URLs and to scope SDP items.

use crate::sdp::AdapterError;
use serde::Serialize;
use std::fmt;

/// Addressing level of a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationLevel {
    /// Project-wide (also used for global resources)
    Project,
    /// Addressed by project and region
    Regional,
    /// Addressed by project and zone
    Zonal,
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationLevel::Project => f.write_str("project"),
            LocationLevel::Regional => f.write_str("regional"),
            LocationLevel::Zonal => f.write_str("zonal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Placement {
    Project,
    Region(String),
    Zone(String),
}

/// Project plus at most one of region or zone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationInfo {
    project_id: String,
    placement: Placement,
}

impl LocationInfo {
    pub fn project(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            placement: Placement::Project,
        }
    }

    pub fn regional(project_id: &str, region: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            placement: Placement::Region(region.to_string()),
        }
    }

    pub fn zonal(project_id: &str, zone: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            placement: Placement::Zone(zone.to_string()),
        }
    }

    /// Parse a scope string back into a location
    ///
    /// The second segment is treated as a zone when it ends in a single
    /// letter suffix (`us-central1-a`), otherwise as a region.
    pub fn from_scope(scope: &str) -> Result<Self, AdapterError> {
        let mut parts = scope.splitn(2, '.');
        let project = parts.next().unwrap_or_default();
        if project.is_empty() {
            return Err(AdapterError::configuration(format!(
                "scope {:?} has no project",
                scope
            )));
        }

        match parts.next() {
            None => Ok(Self::project(project)),
            Some("") => Err(AdapterError::configuration(format!(
                "scope {:?} has an empty location",
                scope
            ))),
            Some(location) if is_zone_name(location) => Ok(Self::zonal(project, location)),
            Some(location) => Ok(Self::regional(project, location)),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn region(&self) -> Option<&str> {
        match &self.placement {
            Placement::Region(region) => Some(region),
            _ => None,
        }
    }

    pub fn zone(&self) -> Option<&str> {
        match &self.placement {
            Placement::Zone(zone) => Some(zone),
            _ => None,
        }
    }

    /// Region of this location; for zones, the enclosing region
    pub fn enclosing_region(&self) -> Option<String> {
        match &self.placement {
            Placement::Project => None,
            Placement::Region(region) => Some(region.clone()),
            Placement::Zone(zone) => Some(region_of_zone(zone)),
        }
    }

    pub fn level(&self) -> LocationLevel {
        match self.placement {
            Placement::Project => LocationLevel::Project,
            Placement::Region(_) => LocationLevel::Regional,
            Placement::Zone(_) => LocationLevel::Zonal,
        }
    }

    /// Scope string of this location
    pub fn scope(&self) -> String {
        match &self.placement {
            Placement::Project => self.project_id.clone(),
            Placement::Region(region) => format!("{}.{}", self.project_id, region),
            Placement::Zone(zone) => format!("{}.{}", self.project_id, zone),
        }
    }

    /// Init parameters in endpoint order: project, then region or zone
    pub fn init_params(&self) -> Vec<&str> {
        match &self.placement {
            Placement::Project => vec![self.project_id.as_str()],
            Placement::Region(region) => vec![self.project_id.as_str(), region.as_str()],
            Placement::Zone(zone) => vec![self.project_id.as_str(), zone.as_str()],
        }
    }
}

impl fmt::Display for LocationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope())
    }
}

/// Region of a zone: `us-central1-a` -> `us-central1`
pub fn region_of_zone(zone: &str) -> String {
    let parts: Vec<&str> = zone.rsplitn(2, '-').collect();
    if parts.len() == 2 {
        parts[1].to_string()
    } else {
        zone.to_string()
    }
}

/// Zone names end in `-<letter>`
pub fn is_zone_name(location: &str) -> bool {
    let mut parts = location.rsplitn(2, '-');
    match (parts.next(), parts.next()) {
        (Some(suffix), Some(prefix)) => {
            suffix.len() == 1
                && suffix.chars().all(|c| c.is_ascii_lowercase())
                && prefix.chars().last().is_some_and(|c| c.is_ascii_digit())
        },
        _ => false,
    }
}
