mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// A window into a filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Builds the window for a 1-based page number. Offsets past the end of
    /// the `i64` range saturate, so far pages come back empty.
    #[must_use]
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            limit,
            offset: page.saturating_sub(1).max(0).saturating_mul(limit),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SiteFilter {
    /// Substring of the site name.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlantationFilter {
    pub site_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesFilter {
    /// Substring of the common or scientific name, case-insensitive.
    pub search: Option<String>,
    pub stratum: Option<String>,
    pub function_ecol: Option<String>,
    pub succession_stage: Option<String>,
    pub desired: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct PlotFilter {
    pub plantation_id: Option<i64>,
    pub plot_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlantInstanceFilter {
    pub plot_id: Option<i64>,
    pub species_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub plantation_id: Option<i64>,
}

/// Store defines the persistence interface for the garden model.
///
/// All reads see live rows only; soft-deleted rows behave as missing. `create_*`
/// ignores the `id` of its argument and returns the stored row. `create_*` and
/// `update_*` validate the entity and check that referenced parents are live,
/// failing with [`Error::Validation`](crate::error::Error::Validation). Unique
/// violations surface as `Error::Conflict`, and so does deleting a row that
/// still has live dependents. Updating or deleting a missing row is
/// `Error::NotFound`. List operations return the page and the total match count.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;
    fn ping(&self) -> Result<()>;

    // Site operations
    fn create_site(&self, site: &Site) -> Result<Site>;
    fn get_site(&self, id: i64) -> Result<Option<Site>>;
    fn get_site_by_name(&self, name: &str) -> Result<Option<Site>>;
    fn list_sites(&self, filter: &SiteFilter, page: Page) -> Result<(Vec<Site>, i64)>;
    fn update_site(&self, site: &Site) -> Result<Site>;
    fn delete_site(&self, id: i64) -> Result<()>;

    // Plantation operations
    fn create_plantation(&self, plantation: &Plantation) -> Result<Plantation>;
    fn get_plantation(&self, id: i64) -> Result<Option<Plantation>>;
    fn list_plantations(
        &self,
        filter: &PlantationFilter,
        page: Page,
    ) -> Result<(Vec<Plantation>, i64)>;
    fn update_plantation(&self, plantation: &Plantation) -> Result<Plantation>;
    fn delete_plantation(&self, id: i64) -> Result<()>;

    // Species operations
    fn create_species(&self, species: &PlantSpecies) -> Result<PlantSpecies>;
    fn get_species(&self, id: i64) -> Result<Option<PlantSpecies>>;
    fn get_species_by_external_ref(&self, external_ref: &str) -> Result<Option<PlantSpecies>>;
    fn list_species(
        &self,
        filter: &SpeciesFilter,
        page: Page,
    ) -> Result<(Vec<PlantSpecies>, i64)>;
    fn update_species(&self, species: &PlantSpecies) -> Result<PlantSpecies>;
    fn delete_species(&self, id: i64) -> Result<()>;

    // Plot operations
    fn create_plot(&self, plot: &Plot) -> Result<Plot>;
    fn get_plot(&self, id: i64) -> Result<Option<Plot>>;
    fn list_plots(&self, filter: &PlotFilter, page: Page) -> Result<(Vec<Plot>, i64)>;
    fn update_plot(&self, plot: &Plot) -> Result<Plot>;
    fn delete_plot(&self, id: i64) -> Result<()>;

    // Plant instance operations
    fn create_plant_instance(&self, instance: &PlantInstance) -> Result<PlantInstance>;
    fn get_plant_instance(&self, id: i64) -> Result<Option<PlantInstance>>;
    fn list_plant_instances(
        &self,
        filter: &PlantInstanceFilter,
        page: Page,
    ) -> Result<(Vec<PlantInstance>, i64)>;
    fn update_plant_instance(&self, instance: &PlantInstance) -> Result<PlantInstance>;
    fn delete_plant_instance(&self, id: i64) -> Result<()>;

    // Suggestion template operations
    fn create_template(&self, template: &SuggestionTemplate) -> Result<SuggestionTemplate>;
    fn get_template(&self, id: i64) -> Result<Option<SuggestionTemplate>>;
    fn list_templates(
        &self,
        filter: &TemplateFilter,
        page: Page,
    ) -> Result<(Vec<SuggestionTemplate>, i64)>;
    fn update_template(&self, template: &SuggestionTemplate) -> Result<SuggestionTemplate>;
    fn delete_template(&self, id: i64) -> Result<()>;

    fn close(&self) -> Result<()>;
}
