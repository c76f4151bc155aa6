//! Emergency event snapshot handed to the dispatch core by the report store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a user in the external user/device directory
pub type UserId = i64;

/// Kind of emergency reported by the citizen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmergencyType {
    Fire,
    Natural,
    Traffic,
    Medical,
    Other,
}

impl std::fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmergencyType::Fire => write!(f, "FIRE"),
            EmergencyType::Natural => write!(f, "NATURAL"),
            EmergencyType::Traffic => write!(f, "TRAFFIC"),
            EmergencyType::Medical => write!(f, "MEDICAL"),
            EmergencyType::Other => write!(f, "OTHER"),
        }
    }
}

/// Geographic position of the emergency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable snapshot of an emergency report at dispatch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyEvent {
    /// Report identifier, used to group delivery records
    pub id: Uuid,
    pub description: String,
    pub emergency_type: EmergencyType,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub people_affected: Option<u32>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

impl EmergencyEvent {
    /// Creates an event with only the mandatory fields set
    pub fn new(description: impl Into<String>, emergency_type: EmergencyType) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            emergency_type,
            severity: None,
            people_affected: None,
            contact_info: None,
            location: None,
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_people_affected(mut self, count: u32) -> Self {
        self.people_affected = Some(count);
        self
    }

    pub fn with_contact_info(mut self, contact: impl Into<String>) -> Self {
        self.contact_info = Some(contact.into());
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location {
            latitude,
            longitude,
        });
        self
    }
}
