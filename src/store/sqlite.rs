use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::schema::SCHEMA;
use super::{
    Page, PlantInstanceFilter, PlantationFilter, PlotFilter, SiteFilter, SpeciesFilter, Store,
    TemplateFilter,
};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        register_casefold(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Registers `casefold(text)`, a Unicode-aware lowercase. SQLite's own `lower`
/// and `LIKE` only fold ASCII.
fn register_casefold(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps a unique-constraint failure to a conflict carrying `message`.
fn conflict_on_constraint(err: rusqlite::Error, message: &str) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(message.to_string())
        }
        e => Error::from(e),
    }
}

/// WHERE-clause builder for list queries. Always restricted to live rows.
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    fn new() -> Self {
        Self {
            clauses: vec!["deleted_at IS NULL".to_string()],
            values: Vec::new(),
        }
    }

    fn eq(&mut self, column: &str, value: Option<impl Into<Value>>) {
        if let Some(value) = value {
            self.values.push(value.into());
            self.clauses
                .push(format!("{column} = ?{}", self.values.len()));
        }
    }

    /// Case-insensitive substring match against any of `columns`.
    fn contains_any(&mut self, columns: &[&str], term: Option<&str>) {
        let Some(term) = term.filter(|t| !t.is_empty()) else {
            return;
        };
        let escaped = term
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        self.values.push(Value::Text(format!("%{escaped}%")));
        let idx = self.values.len();
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("casefold({c}) LIKE ?{idx} ESCAPE '\\'"))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
    }

    fn sql(&self) -> String {
        self.clauses.join(" AND ")
    }
}

fn fetch_one<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    id: i64,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>> {
    conn.query_row(
        &format!("SELECT {columns} FROM {table} WHERE id = ?1 AND deleted_at IS NULL"),
        params![id],
        map,
    )
    .optional()
    .map_err(Error::from)
}

fn fetch_page<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    conditions: Conditions,
    page: Page,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<(Vec<T>, i64)> {
    let where_sql = conditions.sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {where_sql}"),
        params_from_iter(conditions.values.iter()),
        |row| row.get(0),
    )?;

    let n = conditions.values.len();
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM {table} WHERE {where_sql}
         ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        n + 1,
        n + 2
    ))?;

    let mut values = conditions.values;
    values.push(Value::Integer(page.limit));
    values.push(Value::Integer(page.offset));

    let rows = stmt.query_map(params_from_iter(values.iter()), map)?;
    let items = rows
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)?;

    Ok((items, total))
}

fn is_live(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1 AND deleted_at IS NULL"),
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn require_parent(conn: &Connection, table: &str, id: i64, label: &str) -> Result<()> {
    if is_live(conn, table, id)? {
        Ok(())
    } else {
        Err(Error::Validation(format!("{label} {id} does not exist")))
    }
}

fn count_live_children(conn: &Connection, table: &str, column: &str, id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1 AND deleted_at IS NULL"),
        params![id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Refuses the delete when any of `children` (table, column, label) still has
/// live rows pointing at `id`.
fn ensure_no_dependents(
    conn: &Connection,
    id: i64,
    entity: &str,
    children: &[(&str, &str, &str)],
) -> Result<()> {
    for (table, column, label) in children {
        let count = count_live_children(conn, table, column, id)?;
        if count > 0 {
            return Err(Error::Conflict(format!(
                "{entity} is referenced by {count} {label}"
            )));
        }
    }
    Ok(())
}

fn soft_delete(conn: &Connection, table: &str, id: i64) -> Result<()> {
    let rows = conn.execute(
        &format!("UPDATE {table} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL"),
        params![format_datetime(&Utc::now()), id],
    )?;

    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

fn ensure_found(rows: usize) -> Result<()> {
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

fn refetch<T>(found: Option<T>) -> Result<T> {
    found.ok_or(Error::NotFound)
}

const SITE_COLUMNS: &str =
    "id, name, area_m2, length_m, width_m, climate, notes, created_at, updated_at";

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<Site> {
    Ok(Site {
        id: row.get(0)?,
        name: row.get(1)?,
        area_m2: row.get(2)?,
        length_m: row.get(3)?,
        width_m: row.get(4)?,
        climate: row.get(5)?,
        notes: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

const PLANTATION_COLUMNS: &str = "id, site_id, name, area_m2, notes, created_at, updated_at";

fn plantation_from_row(row: &Row<'_>) -> rusqlite::Result<Plantation> {
    Ok(Plantation {
        id: row.get(0)?,
        site_id: row.get(1)?,
        name: row.get(2)?,
        area_m2: row.get(3)?,
        notes: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

const SPECIES_COLUMNS: &str = "id, common_name, scientific_name, stratum, function_ecol, succession_stage, external_ref, desired, notes, created_at, updated_at";

fn species_from_row(row: &Row<'_>) -> rusqlite::Result<PlantSpecies> {
    Ok(PlantSpecies {
        id: row.get(0)?,
        common_name: row.get(1)?,
        scientific_name: row.get(2)?,
        stratum: row.get(3)?,
        function_ecol: row.get(4)?,
        succession_stage: row.get(5)?,
        external_ref: row.get(6)?,
        desired: row.get(7)?,
        notes: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
        updated_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

const PLOT_COLUMNS: &str = "id, plantation_id, name, plot_type, length_m, width_m, diameter_m, soil_type, planting_mode, geometry, notes, created_at, updated_at";

fn plot_from_row(row: &Row<'_>) -> rusqlite::Result<Plot> {
    Ok(Plot {
        id: row.get(0)?,
        plantation_id: row.get(1)?,
        name: row.get(2)?,
        plot_type: row.get(3)?,
        length_m: row.get(4)?,
        width_m: row.get(5)?,
        diameter_m: row.get(6)?,
        soil_type: row.get(7)?,
        planting_mode: row.get(8)?,
        geometry: row.get(9)?,
        notes: row.get(10)?,
        created_at: parse_datetime(&row.get::<_, String>(11)?),
        updated_at: parse_datetime(&row.get::<_, String>(12)?),
    })
}

const INSTANCE_COLUMNS: &str = "id, plot_id, species_id, quantity, role, status, position, planted_at, notes, created_at, updated_at";

fn instance_from_row(row: &Row<'_>) -> rusqlite::Result<PlantInstance> {
    Ok(PlantInstance {
        id: row.get(0)?,
        plot_id: row.get(1)?,
        species_id: row.get(2)?,
        quantity: row.get(3)?,
        role: row.get(4)?,
        status: row.get(5)?,
        position: row.get(6)?,
        planted_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
        notes: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
        updated_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

const TEMPLATE_COLUMNS: &str = "id, plantation_id, name, rules, notes, created_at, updated_at";

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<SuggestionTemplate> {
    let rules: String = row.get(3)?;
    Ok(SuggestionTemplate {
        id: row.get(0)?,
        plantation_id: row.get(1)?,
        name: row.get(2)?,
        rules: serde_json::from_str(&rules).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        notes: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        self.conn().query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    // Site operations

    fn create_site(&self, site: &Site) -> Result<Site> {
        site.validate()?;

        let conn = self.conn();
        conn.execute(
            "INSERT INTO sites (name, area_m2, length_m, width_m, climate, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                site.name,
                site.area_m2,
                site.length_m,
                site.width_m,
                site.climate,
                site.notes,
                format_datetime(&site.created_at),
                format_datetime(&site.updated_at),
            ],
        )
        .map_err(|e| conflict_on_constraint(e, "a site with that name already exists"))?;

        let id = conn.last_insert_rowid();
        refetch(fetch_one(&conn, "sites", SITE_COLUMNS, id, site_from_row)?)
    }

    fn get_site(&self, id: i64) -> Result<Option<Site>> {
        fetch_one(&self.conn(), "sites", SITE_COLUMNS, id, site_from_row)
    }

    fn get_site_by_name(&self, name: &str) -> Result<Option<Site>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SITE_COLUMNS} FROM sites WHERE name = ?1 AND deleted_at IS NULL"),
            params![name],
            site_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sites(&self, filter: &SiteFilter, page: Page) -> Result<(Vec<Site>, i64)> {
        let mut conditions = Conditions::new();
        conditions.contains_any(&["name"], filter.search.as_deref());

        fetch_page(
            &self.conn(),
            "sites",
            SITE_COLUMNS,
            conditions,
            page,
            site_from_row,
        )
    }

    fn update_site(&self, site: &Site) -> Result<Site> {
        site.validate()?;

        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE sites SET name = ?1, area_m2 = ?2, length_m = ?3, width_m = ?4,
                 climate = ?5, notes = ?6, updated_at = ?7
                 WHERE id = ?8 AND deleted_at IS NULL",
                params![
                    site.name,
                    site.area_m2,
                    site.length_m,
                    site.width_m,
                    site.climate,
                    site.notes,
                    format_datetime(&Utc::now()),
                    site.id,
                ],
            )
            .map_err(|e| conflict_on_constraint(e, "a site with that name already exists"))?;
        ensure_found(rows)?;

        refetch(fetch_one(&conn, "sites", SITE_COLUMNS, site.id, site_from_row)?)
    }

    fn delete_site(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        if !is_live(&conn, "sites", id)? {
            return Err(Error::NotFound);
        }
        ensure_no_dependents(
            &conn,
            id,
            "site",
            &[("plantations", "site_id", "plantation(s)")],
        )?;
        soft_delete(&conn, "sites", id)
    }

    // Plantation operations

    fn create_plantation(&self, plantation: &Plantation) -> Result<Plantation> {
        plantation.validate()?;

        let conn = self.conn();
        require_parent(&conn, "sites", plantation.site_id, "site")?;

        conn.execute(
            "INSERT INTO plantations (site_id, name, area_m2, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                plantation.site_id,
                plantation.name,
                plantation.area_m2,
                plantation.notes,
                format_datetime(&plantation.created_at),
                format_datetime(&plantation.updated_at),
            ],
        )?;

        let id = conn.last_insert_rowid();
        refetch(fetch_one(
            &conn,
            "plantations",
            PLANTATION_COLUMNS,
            id,
            plantation_from_row,
        )?)
    }

    fn get_plantation(&self, id: i64) -> Result<Option<Plantation>> {
        fetch_one(
            &self.conn(),
            "plantations",
            PLANTATION_COLUMNS,
            id,
            plantation_from_row,
        )
    }

    fn list_plantations(
        &self,
        filter: &PlantationFilter,
        page: Page,
    ) -> Result<(Vec<Plantation>, i64)> {
        let mut conditions = Conditions::new();
        conditions.eq("site_id", filter.site_id);
        conditions.contains_any(&["name"], filter.search.as_deref());

        fetch_page(
            &self.conn(),
            "plantations",
            PLANTATION_COLUMNS,
            conditions,
            page,
            plantation_from_row,
        )
    }

    fn update_plantation(&self, plantation: &Plantation) -> Result<Plantation> {
        plantation.validate()?;

        let conn = self.conn();
        if !is_live(&conn, "plantations", plantation.id)? {
            return Err(Error::NotFound);
        }
        require_parent(&conn, "sites", plantation.site_id, "site")?;

        let rows = conn.execute(
            "UPDATE plantations SET site_id = ?1, name = ?2, area_m2 = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?6 AND deleted_at IS NULL",
            params![
                plantation.site_id,
                plantation.name,
                plantation.area_m2,
                plantation.notes,
                format_datetime(&Utc::now()),
                plantation.id,
            ],
        )?;
        ensure_found(rows)?;

        refetch(fetch_one(
            &conn,
            "plantations",
            PLANTATION_COLUMNS,
            plantation.id,
            plantation_from_row,
        )?)
    }

    fn delete_plantation(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        if !is_live(&conn, "plantations", id)? {
            return Err(Error::NotFound);
        }
        ensure_no_dependents(
            &conn,
            id,
            "plantation",
            &[
                ("plots", "plantation_id", "plot(s)"),
                ("suggestion_templates", "plantation_id", "suggestion template(s)"),
            ],
        )?;
        soft_delete(&conn, "plantations", id)
    }

    // Species operations

    fn create_species(&self, species: &PlantSpecies) -> Result<PlantSpecies> {
        species.validate()?;

        let conn = self.conn();
        conn.execute(
            "INSERT INTO plant_species (common_name, scientific_name, stratum, function_ecol, succession_stage,
             external_ref, desired, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                species.common_name,
                species.scientific_name,
                species.stratum,
                species.function_ecol,
                species.succession_stage,
                species.external_ref,
                species.desired,
                species.notes,
                format_datetime(&species.created_at),
                format_datetime(&species.updated_at),
            ],
        )
        .map_err(|e| conflict_on_constraint(e, "a species with that external_ref already exists"))?;

        let id = conn.last_insert_rowid();
        refetch(fetch_one(
            &conn,
            "plant_species",
            SPECIES_COLUMNS,
            id,
            species_from_row,
        )?)
    }

    fn get_species(&self, id: i64) -> Result<Option<PlantSpecies>> {
        fetch_one(
            &self.conn(),
            "plant_species",
            SPECIES_COLUMNS,
            id,
            species_from_row,
        )
    }

    fn get_species_by_external_ref(&self, external_ref: &str) -> Result<Option<PlantSpecies>> {
        if external_ref.is_empty() {
            return Ok(None);
        }

        // The unique index spans soft-deleted rows too.
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SPECIES_COLUMNS} FROM plant_species WHERE external_ref = ?1"),
            params![external_ref],
            species_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_species(
        &self,
        filter: &SpeciesFilter,
        page: Page,
    ) -> Result<(Vec<PlantSpecies>, i64)> {
        let mut conditions = Conditions::new();
        conditions.contains_any(
            &["common_name", "scientific_name"],
            filter.search.as_deref(),
        );
        conditions.eq("stratum", filter.stratum.clone());
        conditions.eq("function_ecol", filter.function_ecol.clone());
        conditions.eq("succession_stage", filter.succession_stage.clone());
        conditions.eq("desired", filter.desired);

        fetch_page(
            &self.conn(),
            "plant_species",
            SPECIES_COLUMNS,
            conditions,
            page,
            species_from_row,
        )
    }

    fn update_species(&self, species: &PlantSpecies) -> Result<PlantSpecies> {
        species.validate()?;

        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE plant_species SET common_name = ?1, scientific_name = ?2, stratum = ?3,
                 function_ecol = ?4, succession_stage = ?5, external_ref = ?6, desired = ?7,
                 notes = ?8, updated_at = ?9
                 WHERE id = ?10 AND deleted_at IS NULL",
                params![
                    species.common_name,
                    species.scientific_name,
                    species.stratum,
                    species.function_ecol,
                    species.succession_stage,
                    species.external_ref,
                    species.desired,
                    species.notes,
                    format_datetime(&Utc::now()),
                    species.id,
                ],
            )
            .map_err(|e| {
                conflict_on_constraint(e, "a species with that external_ref already exists")
            })?;
        ensure_found(rows)?;

        refetch(fetch_one(
            &conn,
            "plant_species",
            SPECIES_COLUMNS,
            species.id,
            species_from_row,
        )?)
    }

    fn delete_species(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        if !is_live(&conn, "plant_species", id)? {
            return Err(Error::NotFound);
        }
        ensure_no_dependents(
            &conn,
            id,
            "species",
            &[("plant_instances", "species_id", "plant instance(s)")],
        )?;
        soft_delete(&conn, "plant_species", id)
    }

    // Plot operations

    fn create_plot(&self, plot: &Plot) -> Result<Plot> {
        plot.validate()?;

        let conn = self.conn();
        require_parent(&conn, "plantations", plot.plantation_id, "plantation")?;

        conn.execute(
            "INSERT INTO plots (plantation_id, name, plot_type, length_m, width_m, diameter_m, soil_type,
             planting_mode, geometry, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                plot.plantation_id,
                plot.name,
                plot.plot_type,
                plot.length_m,
                plot.width_m,
                plot.diameter_m,
                plot.soil_type,
                plot.planting_mode,
                plot.geometry,
                plot.notes,
                format_datetime(&plot.created_at),
                format_datetime(&plot.updated_at),
            ],
        )?;

        let id = conn.last_insert_rowid();
        refetch(fetch_one(&conn, "plots", PLOT_COLUMNS, id, plot_from_row)?)
    }

    fn get_plot(&self, id: i64) -> Result<Option<Plot>> {
        fetch_one(&self.conn(), "plots", PLOT_COLUMNS, id, plot_from_row)
    }

    fn list_plots(&self, filter: &PlotFilter, page: Page) -> Result<(Vec<Plot>, i64)> {
        let mut conditions = Conditions::new();
        conditions.eq("plantation_id", filter.plantation_id);
        conditions.eq("plot_type", filter.plot_type.clone());

        fetch_page(
            &self.conn(),
            "plots",
            PLOT_COLUMNS,
            conditions,
            page,
            plot_from_row,
        )
    }

    fn update_plot(&self, plot: &Plot) -> Result<Plot> {
        plot.validate()?;

        let conn = self.conn();
        if !is_live(&conn, "plots", plot.id)? {
            return Err(Error::NotFound);
        }
        require_parent(&conn, "plantations", plot.plantation_id, "plantation")?;

        let rows = conn.execute(
            "UPDATE plots SET plantation_id = ?1, name = ?2, plot_type = ?3, length_m = ?4, width_m = ?5,
             diameter_m = ?6, soil_type = ?7, planting_mode = ?8, geometry = ?9, notes = ?10,
             updated_at = ?11
             WHERE id = ?12 AND deleted_at IS NULL",
            params![
                plot.plantation_id,
                plot.name,
                plot.plot_type,
                plot.length_m,
                plot.width_m,
                plot.diameter_m,
                plot.soil_type,
                plot.planting_mode,
                plot.geometry,
                plot.notes,
                format_datetime(&Utc::now()),
                plot.id,
            ],
        )?;
        ensure_found(rows)?;

        refetch(fetch_one(&conn, "plots", PLOT_COLUMNS, plot.id, plot_from_row)?)
    }

    fn delete_plot(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        if !is_live(&conn, "plots", id)? {
            return Err(Error::NotFound);
        }
        ensure_no_dependents(
            &conn,
            id,
            "plot",
            &[("plant_instances", "plot_id", "plant instance(s)")],
        )?;
        soft_delete(&conn, "plots", id)
    }

    // Plant instance operations

    fn create_plant_instance(&self, instance: &PlantInstance) -> Result<PlantInstance> {
        instance.validate()?;

        let conn = self.conn();
        require_parent(&conn, "plots", instance.plot_id, "plot")?;
        require_parent(&conn, "plant_species", instance.species_id, "species")?;

        conn.execute(
            "INSERT INTO plant_instances (plot_id, species_id, quantity, role, status, position, planted_at,
             notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                instance.plot_id,
                instance.species_id,
                instance.quantity,
                instance.role,
                instance.status,
                instance.position,
                instance.planted_at.as_ref().map(format_datetime),
                instance.notes,
                format_datetime(&instance.created_at),
                format_datetime(&instance.updated_at),
            ],
        )?;

        let id = conn.last_insert_rowid();
        refetch(fetch_one(
            &conn,
            "plant_instances",
            INSTANCE_COLUMNS,
            id,
            instance_from_row,
        )?)
    }

    fn get_plant_instance(&self, id: i64) -> Result<Option<PlantInstance>> {
        fetch_one(
            &self.conn(),
            "plant_instances",
            INSTANCE_COLUMNS,
            id,
            instance_from_row,
        )
    }

    fn list_plant_instances(
        &self,
        filter: &PlantInstanceFilter,
        page: Page,
    ) -> Result<(Vec<PlantInstance>, i64)> {
        let mut conditions = Conditions::new();
        conditions.eq("plot_id", filter.plot_id);
        conditions.eq("species_id", filter.species_id);
        conditions.eq("status", filter.status.clone());

        fetch_page(
            &self.conn(),
            "plant_instances",
            INSTANCE_COLUMNS,
            conditions,
            page,
            instance_from_row,
        )
    }

    fn update_plant_instance(&self, instance: &PlantInstance) -> Result<PlantInstance> {
        instance.validate()?;

        let conn = self.conn();
        if !is_live(&conn, "plant_instances", instance.id)? {
            return Err(Error::NotFound);
        }
        require_parent(&conn, "plots", instance.plot_id, "plot")?;
        require_parent(&conn, "plant_species", instance.species_id, "species")?;

        let rows = conn.execute(
            "UPDATE plant_instances SET plot_id = ?1, species_id = ?2, quantity = ?3, role = ?4, status = ?5,
             position = ?6, planted_at = ?7, notes = ?8, updated_at = ?9
             WHERE id = ?10 AND deleted_at IS NULL",
            params![
                instance.plot_id,
                instance.species_id,
                instance.quantity,
                instance.role,
                instance.status,
                instance.position,
                instance.planted_at.as_ref().map(format_datetime),
                instance.notes,
                format_datetime(&Utc::now()),
                instance.id,
            ],
        )?;
        ensure_found(rows)?;

        refetch(fetch_one(
            &conn,
            "plant_instances",
            INSTANCE_COLUMNS,
            instance.id,
            instance_from_row,
        )?)
    }

    fn delete_plant_instance(&self, id: i64) -> Result<()> {
        soft_delete(&self.conn(), "plant_instances", id)
    }

    // Suggestion template operations

    fn create_template(&self, template: &SuggestionTemplate) -> Result<SuggestionTemplate> {
        template.validate()?;
        let rules = serde_json::to_string(&template.rules)?;

        let conn = self.conn();
        require_parent(&conn, "plantations", template.plantation_id, "plantation")?;

        conn.execute(
            "INSERT INTO suggestion_templates (plantation_id, name, rules, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                template.plantation_id,
                template.name,
                rules,
                template.notes,
                format_datetime(&template.created_at),
                format_datetime(&template.updated_at),
            ],
        )?;

        let id = conn.last_insert_rowid();
        refetch(fetch_one(
            &conn,
            "suggestion_templates",
            TEMPLATE_COLUMNS,
            id,
            template_from_row,
        )?)
    }

    fn get_template(&self, id: i64) -> Result<Option<SuggestionTemplate>> {
        fetch_one(
            &self.conn(),
            "suggestion_templates",
            TEMPLATE_COLUMNS,
            id,
            template_from_row,
        )
    }

    fn list_templates(
        &self,
        filter: &TemplateFilter,
        page: Page,
    ) -> Result<(Vec<SuggestionTemplate>, i64)> {
        let mut conditions = Conditions::new();
        conditions.eq("plantation_id", filter.plantation_id);

        fetch_page(
            &self.conn(),
            "suggestion_templates",
            TEMPLATE_COLUMNS,
            conditions,
            page,
            template_from_row,
        )
    }

    fn update_template(&self, template: &SuggestionTemplate) -> Result<SuggestionTemplate> {
        template.validate()?;
        let rules = serde_json::to_string(&template.rules)?;

        let conn = self.conn();
        if !is_live(&conn, "suggestion_templates", template.id)? {
            return Err(Error::NotFound);
        }
        require_parent(&conn, "plantations", template.plantation_id, "plantation")?;

        let rows = conn.execute(
            "UPDATE suggestion_templates SET plantation_id = ?1, name = ?2, rules = ?3, notes = ?4,
             updated_at = ?5
             WHERE id = ?6 AND deleted_at IS NULL",
            params![
                template.plantation_id,
                template.name,
                rules,
                template.notes,
                format_datetime(&Utc::now()),
                template.id,
            ],
        )?;
        ensure_found(rows)?;

        refetch(fetch_one(
            &conn,
            "suggestion_templates",
            TEMPLATE_COLUMNS,
            template.id,
            template_from_row,
        )?)
    }

    fn delete_template(&self, id: i64) -> Result<()> {
        soft_delete(&self.conn(), "suggestion_templates", id)
    }

    /// Folds the write-ahead log back into the main database file. The
    /// connection itself closes when the store is dropped.
    fn close(&self) -> Result<()> {
        self.conn().query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}
