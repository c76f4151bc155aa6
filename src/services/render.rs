//! Message renderer.
//!
//! Builds the channel-agnostic alert text for an emergency event. Rendering is
//! pure and deterministic: identical events always produce identical output.

use serde::Serialize;

use crate::error::RenderError;
use crate::models::{EmergencyEvent, Location};

const ALERT_MARKER: &str = "🚨 EMERGENCY ALERT 🚨";
const HASHTAGS: &str = "#EmergencyAlert #ResQApp";

/// Rendered alert, shared by every channel of a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub title: String,
    pub body: String,
}

/// Renders an emergency event into a title and body
pub fn render(event: &EmergencyEvent) -> Result<RenderedMessage, RenderError> {
    let description = event.description.trim();
    if description.is_empty() {
        return Err(RenderError::MissingDescription);
    }

    if let Some(location) = &event.location {
        validate_location(location)?;
    }

    let mut body = format!(
        "{}\n\n{}\n\n🔴 Type: {}",
        ALERT_MARKER, description, event.emergency_type
    );

    if let Some(severity) = present(&event.severity) {
        body.push_str(&format!("\n⚠️ Severity: {}", severity));
    }

    if let Some(count) = event.people_affected {
        body.push_str(&format!("\n👥 People affected: {}", count));
    }

    if let Some(contact) = present(&event.contact_info) {
        body.push_str(&format!("\n📞 Contact: {}", contact));
    }

    if let Some(location) = &event.location {
        let coords = format!(
            "{},{}",
            coordinate(location.latitude),
            coordinate(location.longitude)
        );
        body.push_str(&format!("\n📍 Location: {}", coords));
        body.push_str(&format!("\n🗺️ Map: {}", map_link(location)));
    }

    body.push_str("\n\n");
    body.push_str(HASHTAGS);

    Ok(RenderedMessage {
        title: format!("EMERGENCY ALERT: {}", event.emergency_type),
        body,
    })
}

/// Google Maps link for a location
pub fn map_link(location: &Location) -> String {
    format!(
        "https://www.google.com/maps?q={},{}",
        coordinate(location.latitude),
        coordinate(location.longitude)
    )
}

/// Formats a coordinate keeping at least one decimal (`40.0`, not `40`)
fn coordinate(value: f64) -> String {
    format!("{:?}", value)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn validate_location(location: &Location) -> Result<(), RenderError> {
    check_coordinate("latitude", location.latitude, 90.0)?;
    check_coordinate("longitude", location.longitude, 180.0)
}

fn check_coordinate(field: &'static str, value: f64, bound: f64) -> Result<(), RenderError> {
    if !value.is_finite() {
        return Err(RenderError::NonFiniteCoordinate { field });
    }
    if !(-bound..=bound).contains(&value) {
        return Err(RenderError::CoordinateOutOfRange {
            field,
            value,
            min: -bound,
            max: bound,
        });
    }
    Ok(())
}
