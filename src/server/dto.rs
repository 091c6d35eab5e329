use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::Principal;
use crate::config::PaginationLimits;
use crate::server::response::Pagination;
use crate::store::Page;
use crate::types::constants::status;
use crate::types::{Plantation, PlantInstance, PlantSpecies, Plot, Site, SuggestionTemplate};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_status() -> String {
    status::PLANNED.to_string()
}

/// Treats `?field=` the same as an omitted field.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// Pagination

/// The page a list request resolved to after defaults and caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    /// Parses raw `page` and `limit` query values. Missing, unparsable or
    /// non-positive values fall back to page 1 and the default limit. The limit
    /// is capped by the caller's role.
    #[must_use]
    pub fn resolve(
        page: Option<&str>,
        limit: Option<&str>,
        limits: &PaginationLimits,
        principal: Option<&Principal>,
    ) -> Self {
        let positive = |raw: Option<&str>| {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v > 0)
        };

        let max = limits.max_for(principal.map(|p| p.role));
        let limit = positive(limit).unwrap_or(limits.default_limit).min(max);

        Self {
            page: positive(page).unwrap_or(1),
            limit,
        }
    }

    #[must_use]
    pub fn store_page(&self) -> Page {
        Page::new(self.page, self.limit)
    }

    #[must_use]
    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination::new(self.page, self.limit, total)
    }
}

// Sites

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub name: String,
    #[serde(default)]
    pub area_m2: f64,
    #[serde(default)]
    pub length_m: f64,
    #[serde(default)]
    pub width_m: f64,
    #[serde(default)]
    pub climate: String,
    #[serde(default)]
    pub notes: String,
}

impl CreateSiteRequest {
    #[must_use]
    pub fn into_site(self, now: DateTime<Utc>) -> Site {
        Site {
            id: 0,
            name: self.name.trim().to_string(),
            area_m2: self.area_m2,
            length_m: self.length_m,
            width_m: self.width_m,
            climate: self.climate,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSiteRequest {
    pub name: Option<String>,
    pub area_m2: Option<f64>,
    pub length_m: Option<f64>,
    pub width_m: Option<f64>,
    pub climate: Option<String>,
    pub notes: Option<String>,
}

impl UpdateSiteRequest {
    pub fn apply_to(self, site: &mut Site) {
        if let Some(name) = self.name {
            site.name = name.trim().to_string();
        }
        if let Some(area_m2) = self.area_m2 {
            site.area_m2 = area_m2;
        }
        if let Some(length_m) = self.length_m {
            site.length_m = length_m;
        }
        if let Some(width_m) = self.width_m {
            site.width_m = width_m;
        }
        if let Some(climate) = self.climate {
            site.climate = climate;
        }
        if let Some(notes) = self.notes {
            site.notes = notes;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSitesParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    #[serde(flatten)]
    pub site: Site,
    pub effective_area_m2: f64,
}

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        Self {
            effective_area_m2: site.effective_area(),
            site,
        }
    }
}

// Plantations

#[derive(Debug, Deserialize)]
pub struct CreatePlantationRequest {
    pub site_id: i64,
    pub name: String,
    #[serde(default)]
    pub area_m2: f64,
    #[serde(default)]
    pub notes: String,
}

impl CreatePlantationRequest {
    #[must_use]
    pub fn into_plantation(self, now: DateTime<Utc>) -> Plantation {
        Plantation {
            id: 0,
            site_id: self.site_id,
            name: self.name.trim().to_string(),
            area_m2: self.area_m2,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlantationRequest {
    pub site_id: Option<i64>,
    pub name: Option<String>,
    pub area_m2: Option<f64>,
    pub notes: Option<String>,
}

impl UpdatePlantationRequest {
    pub fn apply_to(self, plantation: &mut Plantation) {
        if let Some(site_id) = self.site_id {
            plantation.site_id = site_id;
        }
        if let Some(name) = self.name {
            plantation.name = name.trim().to_string();
        }
        if let Some(area_m2) = self.area_m2 {
            plantation.area_m2 = area_m2;
        }
        if let Some(notes) = self.notes {
            plantation.notes = notes;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPlantationsParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub site_id: Option<i64>,
    pub search: Option<String>,
}

// Species

#[derive(Debug, Deserialize)]
pub struct CreateSpeciesRequest {
    pub common_name: String,
    #[serde(default)]
    pub scientific_name: String,
    #[serde(default)]
    pub stratum: String,
    #[serde(default)]
    pub function_ecol: String,
    #[serde(default)]
    pub succession_stage: String,
    #[serde(default)]
    pub external_ref: String,
    #[serde(default)]
    pub desired: bool,
    #[serde(default)]
    pub notes: String,
}

impl CreateSpeciesRequest {
    #[must_use]
    pub fn into_species(self, now: DateTime<Utc>) -> PlantSpecies {
        PlantSpecies {
            id: 0,
            common_name: self.common_name.trim().to_string(),
            scientific_name: self.scientific_name,
            stratum: self.stratum,
            function_ecol: self.function_ecol,
            succession_stage: self.succession_stage,
            external_ref: self.external_ref.trim().to_string(),
            desired: self.desired,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSpeciesRequest {
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub stratum: Option<String>,
    pub function_ecol: Option<String>,
    pub succession_stage: Option<String>,
    pub external_ref: Option<String>,
    pub desired: Option<bool>,
    pub notes: Option<String>,
}

impl UpdateSpeciesRequest {
    pub fn apply_to(self, species: &mut PlantSpecies) {
        if let Some(common_name) = self.common_name {
            species.common_name = common_name.trim().to_string();
        }
        if let Some(scientific_name) = self.scientific_name {
            species.scientific_name = scientific_name;
        }
        if let Some(stratum) = self.stratum {
            species.stratum = stratum;
        }
        if let Some(function_ecol) = self.function_ecol {
            species.function_ecol = function_ecol;
        }
        if let Some(succession_stage) = self.succession_stage {
            species.succession_stage = succession_stage;
        }
        if let Some(external_ref) = self.external_ref {
            species.external_ref = external_ref.trim().to_string();
        }
        if let Some(desired) = self.desired {
            species.desired = desired;
        }
        if let Some(notes) = self.notes {
            species.notes = notes;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSpeciesParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub stratum: Option<String>,
    pub function_ecol: Option<String>,
    pub succession_stage: Option<String>,
    pub desired: Option<bool>,
}

// Plots

#[derive(Debug, Deserialize)]
pub struct CreatePlotRequest {
    pub plantation_id: i64,
    pub plot_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub length_m: f64,
    #[serde(default)]
    pub width_m: f64,
    #[serde(default)]
    pub diameter_m: f64,
    #[serde(default)]
    pub soil_type: String,
    #[serde(default)]
    pub planting_mode: String,
    #[serde(default)]
    pub geometry: String,
    #[serde(default)]
    pub notes: String,
}

impl CreatePlotRequest {
    #[must_use]
    pub fn into_plot(self, now: DateTime<Utc>) -> Plot {
        Plot {
            id: 0,
            plantation_id: self.plantation_id,
            name: self.name,
            plot_type: self.plot_type,
            length_m: self.length_m,
            width_m: self.width_m,
            diameter_m: self.diameter_m,
            soil_type: self.soil_type,
            planting_mode: self.planting_mode,
            geometry: self.geometry,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlotRequest {
    pub plantation_id: Option<i64>,
    pub plot_type: Option<String>,
    pub name: Option<String>,
    pub length_m: Option<f64>,
    pub width_m: Option<f64>,
    pub diameter_m: Option<f64>,
    pub soil_type: Option<String>,
    pub planting_mode: Option<String>,
    pub geometry: Option<String>,
    pub notes: Option<String>,
}

impl UpdatePlotRequest {
    pub fn apply_to(self, plot: &mut Plot) {
        if let Some(plantation_id) = self.plantation_id {
            plot.plantation_id = plantation_id;
        }
        if let Some(plot_type) = self.plot_type {
            plot.plot_type = plot_type;
        }
        if let Some(name) = self.name {
            plot.name = name;
        }
        if let Some(length_m) = self.length_m {
            plot.length_m = length_m;
        }
        if let Some(width_m) = self.width_m {
            plot.width_m = width_m;
        }
        if let Some(diameter_m) = self.diameter_m {
            plot.diameter_m = diameter_m;
        }
        if let Some(soil_type) = self.soil_type {
            plot.soil_type = soil_type;
        }
        if let Some(planting_mode) = self.planting_mode {
            plot.planting_mode = planting_mode;
        }
        if let Some(geometry) = self.geometry {
            plot.geometry = geometry;
        }
        if let Some(notes) = self.notes {
            plot.notes = notes;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPlotsParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub plantation_id: Option<i64>,
    pub plot_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlotResponse {
    #[serde(flatten)]
    pub plot: Plot,
    pub area_m2: f64,
}

impl From<Plot> for PlotResponse {
    fn from(plot: Plot) -> Self {
        Self {
            area_m2: plot.area(),
            plot,
        }
    }
}

// Plant instances

#[derive(Debug, Deserialize)]
pub struct CreatePlantInstanceRequest {
    pub plot_id: i64,
    pub species_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub planted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

impl CreatePlantInstanceRequest {
    #[must_use]
    pub fn into_instance(self, now: DateTime<Utc>) -> PlantInstance {
        let mut instance = PlantInstance {
            id: 0,
            plot_id: self.plot_id,
            species_id: self.species_id,
            quantity: self.quantity,
            role: self.role,
            status: String::new(),
            position: self.position,
            planted_at: self.planted_at,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        };
        instance.transition(&self.status, now);
        instance
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlantInstanceRequest {
    pub plot_id: Option<i64>,
    pub species_id: Option<i64>,
    pub quantity: Option<i64>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub position: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub planted_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<String>,
}

impl UpdatePlantInstanceRequest {
    pub fn apply_to(self, instance: &mut PlantInstance, now: DateTime<Utc>) {
        if let Some(plot_id) = self.plot_id {
            instance.plot_id = plot_id;
        }
        if let Some(species_id) = self.species_id {
            instance.species_id = species_id;
        }
        if let Some(quantity) = self.quantity {
            instance.quantity = quantity;
        }
        if let Some(role) = self.role {
            instance.role = role;
        }
        if let Some(position) = self.position {
            instance.position = position;
        }
        if let Some(planted_at) = self.planted_at {
            instance.planted_at = planted_at;
        }
        if let Some(notes) = self.notes {
            instance.notes = notes;
        }
        if let Some(status) = self.status {
            instance.transition(&status, now);
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPlantInstancesParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub plot_id: Option<i64>,
    pub species_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlantInstanceResponse {
    #[serde(flatten)]
    pub instance: PlantInstance,
    pub density_per_m2: f64,
}

impl PlantInstanceResponse {
    #[must_use]
    pub fn new(instance: PlantInstance, plot_area: f64) -> Self {
        Self {
            density_per_m2: instance.density(plot_area),
            instance,
        }
    }
}

// Suggestion templates

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub plantation_id: i64,
    pub name: String,
    #[serde(default = "empty_object")]
    pub rules: serde_json::Value,
    #[serde(default)]
    pub notes: String,
}

impl CreateTemplateRequest {
    #[must_use]
    pub fn into_template(self, now: DateTime<Utc>) -> SuggestionTemplate {
        SuggestionTemplate {
            id: 0,
            plantation_id: self.plantation_id,
            name: self.name.trim().to_string(),
            rules: self.rules,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTemplateRequest {
    pub plantation_id: Option<i64>,
    pub name: Option<String>,
    pub rules: Option<serde_json::Value>,
    pub notes: Option<String>,
}

impl UpdateTemplateRequest {
    pub fn apply_to(self, template: &mut SuggestionTemplate) {
        if let Some(plantation_id) = self.plantation_id {
            template.plantation_id = plantation_id;
        }
        if let Some(name) = self.name {
            template.name = name.trim().to_string();
        }
        if let Some(rules) = self.rules {
            template.rules = rules;
        }
        if let Some(notes) = self.notes {
            template.notes = notes;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTemplatesParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub plantation_id: Option<i64>,
}
