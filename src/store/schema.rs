pub const SCHEMA: &str = r#"
-- Physical garden areas
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    area_m2 REAL NOT NULL DEFAULT 0,       -- declared area, 0 = derive from length x width
    length_m REAL NOT NULL DEFAULT 0,
    width_m REAL NOT NULL DEFAULT 0,
    climate TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    deleted_at TEXT                        -- NULL = live row
);

-- Cultivation zones inside a site
CREATE TABLE IF NOT EXISTS plantations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    name TEXT NOT NULL,
    area_m2 REAL NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    deleted_at TEXT
);

-- Species catalog
CREATE TABLE IF NOT EXISTS plant_species (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    common_name TEXT NOT NULL,
    scientific_name TEXT NOT NULL DEFAULT '',
    stratum TEXT NOT NULL DEFAULT '',
    function_ecol TEXT NOT NULL DEFAULT '',
    succession_stage TEXT NOT NULL DEFAULT '',
    external_ref TEXT NOT NULL DEFAULT '',  -- '' = no external catalog entry
    desired INTEGER NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    deleted_at TEXT
);

-- Planting beds
CREATE TABLE IF NOT EXISTS plots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plantation_id INTEGER NOT NULL REFERENCES plantations(id),
    name TEXT NOT NULL DEFAULT '',
    plot_type TEXT NOT NULL,
    length_m REAL NOT NULL DEFAULT 0,      -- line plots
    width_m REAL NOT NULL DEFAULT 0,       -- line plots
    diameter_m REAL NOT NULL DEFAULT 0,    -- island plots
    soil_type TEXT NOT NULL DEFAULT '',
    planting_mode TEXT NOT NULL DEFAULT '',
    geometry TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    deleted_at TEXT
);

-- Species placed in plots
CREATE TABLE IF NOT EXISTS plant_instances (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plot_id INTEGER NOT NULL REFERENCES plots(id),
    species_id INTEGER NOT NULL REFERENCES plant_species(id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    role TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL,
    position TEXT NOT NULL DEFAULT '',
    planted_at TEXT,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    deleted_at TEXT
);

-- Recommendation rule sets attached to a plantation
CREATE TABLE IF NOT EXISTS suggestion_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plantation_id INTEGER NOT NULL REFERENCES plantations(id),
    name TEXT NOT NULL,
    rules TEXT NOT NULL DEFAULT '{}',      -- JSON object, opaque to the store
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    deleted_at TEXT
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_sites_name ON sites(name) WHERE deleted_at IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_species_external_ref
    ON plant_species(external_ref) WHERE external_ref <> '';
CREATE INDEX IF NOT EXISTS idx_species_common_name ON plant_species(common_name);
CREATE INDEX IF NOT EXISTS idx_species_stratum ON plant_species(stratum);
CREATE INDEX IF NOT EXISTS idx_species_function ON plant_species(function_ecol);
CREATE INDEX IF NOT EXISTS idx_species_succession ON plant_species(succession_stage);
CREATE INDEX IF NOT EXISTS idx_plantations_site ON plantations(site_id);
CREATE INDEX IF NOT EXISTS idx_plots_plantation ON plots(plantation_id);
CREATE INDEX IF NOT EXISTS idx_plots_type ON plots(plot_type);
CREATE INDEX IF NOT EXISTS idx_instances_plot ON plant_instances(plot_id);
CREATE INDEX IF NOT EXISTS idx_instances_species ON plant_instances(species_id);
CREATE INDEX IF NOT EXISTS idx_instances_status ON plant_instances(status);
CREATE INDEX IF NOT EXISTS idx_templates_plantation ON suggestion_templates(plantation_id);
"#;
