use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::constants::{
    function, planting_mode, plot_type, role, soil_type, status, stratum, succession,
};
use crate::error::{Error, Result};

/// Fixed approximation of pi used for island areas. Area and density figures are
/// reported against this literal, not `std::f64::consts::PI`.
#[allow(clippy::approx_constant)]
pub const PI_APPROX: f64 = 3.14159;

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn check_optional(value: &str, is_valid: fn(&str) -> bool, message: &str) -> Result<()> {
    if !value.is_empty() && !is_valid(value) {
        return Err(Error::validation(message));
    }
    Ok(())
}

/// A physical garden area. Top of the ownership tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub area_m2: f64,
    pub length_m: f64,
    pub width_m: f64,
    pub climate: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.name) {
            return Err(Error::validation("site name is required"));
        }
        if self.area_m2 < 0.0 {
            return Err(Error::validation("site area cannot be negative"));
        }
        if self.length_m < 0.0 || self.width_m < 0.0 {
            return Err(Error::validation("site length and width cannot be negative"));
        }
        Ok(())
    }

    /// Declared area when present, otherwise length times width.
    #[must_use]
    pub fn effective_area(&self) -> f64 {
        if self.area_m2 > 0.0 {
            self.area_m2
        } else {
            self.length_m * self.width_m
        }
    }
}

/// A cultivation zone inside a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plantation {
    pub id: i64,
    pub site_id: i64,
    pub name: String,
    pub area_m2: f64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plantation {
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.name) {
            return Err(Error::validation("plantation name is required"));
        }
        if self.site_id <= 0 {
            return Err(Error::validation("site is required"));
        }
        if self.area_m2 < 0.0 {
            return Err(Error::validation("plantation area cannot be negative"));
        }
        Ok(())
    }
}

/// A catalog entry for a botanical species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantSpecies {
    pub id: i64,
    pub common_name: String,
    pub scientific_name: String,
    pub stratum: String,
    pub function_ecol: String,
    pub succession_stage: String,
    /// Reference into an external plant catalog. Unique when non-empty.
    pub external_ref: String,
    /// Marks the species as wanted for future plantings.
    pub desired: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlantSpecies {
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.common_name) {
            return Err(Error::validation("common name is required"));
        }
        check_optional(&self.stratum, stratum::is_valid, "invalid stratum")?;
        check_optional(
            &self.function_ecol,
            function::is_valid,
            "invalid ecological function",
        )?;
        check_optional(
            &self.succession_stage,
            succession::is_valid,
            "invalid succession stage",
        )?;
        Ok(())
    }
}

/// A planting bed within a plantation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plot {
    pub id: i64,
    pub plantation_id: i64,
    pub name: String,
    pub plot_type: String,
    pub length_m: f64,
    pub width_m: f64,
    pub diameter_m: f64,
    pub soil_type: String,
    pub planting_mode: String,
    /// Free-form shape descriptor, stored as given.
    pub geometry: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plot {
    pub fn validate(&self) -> Result<()> {
        if self.plot_type.is_empty() {
            return Err(Error::validation("plot type is required"));
        }
        if self.plantation_id <= 0 {
            return Err(Error::validation("plantation is required"));
        }
        if !plot_type::is_valid(&self.plot_type) {
            return Err(Error::validation("invalid plot type"));
        }
        check_optional(&self.soil_type, soil_type::is_valid, "invalid soil type")?;
        check_optional(
            &self.planting_mode,
            planting_mode::is_valid,
            "invalid planting mode",
        )?;

        match self.plot_type.as_str() {
            plot_type::LINE if self.length_m <= 0.0 || self.width_m <= 0.0 => Err(
                Error::validation("line plots require length_m and width_m greater than zero"),
            ),
            plot_type::ISLAND if self.diameter_m <= 0.0 => Err(Error::validation(
                "island plots require diameter_m greater than zero",
            )),
            _ => Ok(()),
        }
    }

    /// Bed area in square metres. Guilds have no fixed geometry and report zero.
    #[must_use]
    pub fn area(&self) -> f64 {
        match self.plot_type.as_str() {
            plot_type::LINE => self.length_m * self.width_m,
            plot_type::ISLAND => {
                let radius = self.diameter_m / 2.0;
                PI_APPROX * radius * radius
            }
            _ => 0.0,
        }
    }
}

/// Some quantity of one species placed in one plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantInstance {
    pub id: i64,
    pub plot_id: i64,
    pub species_id: i64,
    pub quantity: i64,
    pub role: String,
    pub status: String,
    pub position: String,
    pub planted_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlantInstance {
    pub fn validate(&self) -> Result<()> {
        if self.status.is_empty() {
            return Err(Error::validation("status is required"));
        }
        if self.plot_id <= 0 {
            return Err(Error::validation("plot is required"));
        }
        if self.species_id <= 0 {
            return Err(Error::validation("species is required"));
        }
        if !status::is_valid(&self.status) {
            return Err(Error::validation("invalid status"));
        }
        check_optional(&self.role, role::is_valid, "invalid role")?;
        if self.quantity <= 0 {
            return Err(Error::validation("quantity must be greater than zero"));
        }
        Ok(())
    }

    /// Plants per square metre, zero for plots without a positive area.
    #[must_use]
    pub fn density(&self, plot_area: f64) -> f64 {
        if plot_area <= 0.0 {
            return 0.0;
        }
        self.quantity as f64 / plot_area
    }

    /// Moves the instance to a new status. Entering the planted state stamps
    /// `planted_at` unless a date was already recorded.
    pub fn transition(&mut self, new_status: &str, now: DateTime<Utc>) {
        self.status = new_status.to_string();
        if new_status == status::PLANTED && self.planted_at.is_none() {
            self.planted_at = Some(now);
        }
    }
}

/// Density, stratum and succession recommendations attached to a plantation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionTemplate {
    pub id: i64,
    pub plantation_id: i64,
    pub name: String,
    /// Opaque rule document. Must be a JSON object.
    pub rules: serde_json::Value,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SuggestionTemplate {
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.name) {
            return Err(Error::validation("template name is required"));
        }
        if self.plantation_id <= 0 {
            return Err(Error::validation("plantation is required"));
        }
        if !self.rules.is_object() {
            return Err(Error::validation("template rules must be a JSON object"));
        }
        Ok(())
    }
}
