//! Fixed value sets for the enumerated fields of the garden model.
//!
//! Each category exposes its literal values (in display order) as `ALL` and a
//! membership predicate `is_valid`. Empty strings are never members; callers decide
//! whether an empty value is acceptable for the field they are checking.

use serde::Serialize;

/// Vegetation layers, by height at maturity.
pub mod stratum {
    /// Large trees, above 25 m.
    pub const EMERGENT: &str = "emergente";
    /// Medium trees, 15 to 25 m.
    pub const HIGH: &str = "alto";
    /// Small trees and shrubs, 5 to 15 m.
    pub const MEDIUM: &str = "medio";
    /// Shrubs and herbs, 1 to 5 m.
    pub const LOW: &str = "bajo";
    /// Ground cover, under 1 m.
    pub const GROUND: &str = "rastrero";
    pub const CLIMBER: &str = "trepador";
    /// Roots and tubers.
    pub const ROOT: &str = "raiz";

    pub const ALL: &[&str] = &[EMERGENT, HIGH, MEDIUM, LOW, GROUND, CLIMBER, ROOT];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Succession stages of a planting.
pub mod succession {
    /// Soil preparation.
    pub const PLACENTA: &str = "placenta";
    pub const PIONEER: &str = "pionera";
    pub const SECONDARY: &str = "secundaria";
    pub const CLIMAX: &str = "climax";

    pub const ALL: &[&str] = &[PLACENTA, PIONEER, SECONDARY, CLIMAX];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Ecological functions a species fulfils in the system.
pub mod function {
    pub const NITROGEN_FIXER: &str = "fijador_nitrogeno";
    pub const DYNAMIC_ACCUMULATOR: &str = "acumulador_dinamico";
    pub const GROUND_COVER: &str = "cobertura_suelo";
    pub const WINDBREAK: &str = "cortaviento";
    pub const POLLINATOR: &str = "polinizador";
    pub const PEST_CONTROL: &str = "control_plagas";
    pub const SOIL_AERATION: &str = "aireacion_suelo";
    pub const WATER_REGULATION: &str = "regulacion_agua";
    pub const BIOMASS_PRODUCTION: &str = "produccion_biomasa";
    pub const FOOD: &str = "alimentario";
    pub const MEDICINAL: &str = "medicinal";
    pub const TIMBER: &str = "maderable";
    pub const FIBER: &str = "fibra";
    pub const ORNAMENTAL: &str = "ornamental";

    pub const ALL: &[&str] = &[
        NITROGEN_FIXER,
        DYNAMIC_ACCUMULATOR,
        GROUND_COVER,
        WINDBREAK,
        POLLINATOR,
        PEST_CONTROL,
        SOIL_AERATION,
        WATER_REGULATION,
        BIOMASS_PRODUCTION,
        FOOD,
        MEDICINAL,
        TIMBER,
        FIBER,
        ORNAMENTAL,
    ];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// How plants are introduced into a plot.
pub mod planting_mode {
    pub const SEED: &str = "semilla";
    pub const CUTTING: &str = "esqueje";
    pub const STAKE: &str = "estaca";
    pub const SEEDLING: &str = "planta";
    pub const TREE: &str = "arbol";

    pub const ALL: &[&str] = &[SEED, CUTTING, STAKE, SEEDLING, TREE];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Lifecycle status of a plant instance.
pub mod status {
    pub const PLANNED: &str = "planeada";
    pub const GERMINATING: &str = "germinacion";
    pub const SEEDLING: &str = "plantula";
    pub const PLANTED: &str = "plantada";
    pub const ESTABLISHED: &str = "establecida";
    pub const PRODUCTIVE: &str = "productiva";
    pub const DORMANT: &str = "dormante";
    pub const DEAD: &str = "muerta";

    pub const ALL: &[&str] = &[
        PLANNED,
        GERMINATING,
        SEEDLING,
        PLANTED,
        ESTABLISHED,
        PRODUCTIVE,
        DORMANT,
        DEAD,
    ];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Shapes of a planting bed.
pub mod plot_type {
    pub const LINE: &str = "line";
    /// Circular bed, sized by its diameter.
    pub const ISLAND: &str = "island";
    pub const GUILD: &str = "guild";

    pub const ALL: &[&str] = &[LINE, ISLAND, GUILD];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Role of a plant instance within its plot.
pub mod role {
    pub const TARGET: &str = "target";
    pub const SERVICE: &str = "service";
    pub const COMPANION: &str = "companion";

    pub const ALL: &[&str] = &[TARGET, SERVICE, COMPANION];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

pub mod soil_type {
    /// Clay.
    pub const ARGILOSO: &str = "argiloso";
    /// Sandy.
    pub const ARENOSO: &str = "arenoso";
    /// Loam.
    pub const FRANCO: &str = "franco";
    /// Humus rich.
    pub const HUMIFERO: &str = "humifero";
    /// Stony.
    pub const PEDREGOSO: &str = "pedregoso";
    /// Prone to waterlogging.
    pub const ANEGADIZO: &str = "anegadizo";

    pub const ALL: &[&str] = &[ARGILOSO, ARENOSO, FRANCO, HUMIFERO, PEDREGOSO, ANEGADIZO];

    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        ALL.contains(&value)
    }
}

/// Every value set, as served by the constants endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Constants {
    pub strata: &'static [&'static str],
    pub succession_stages: &'static [&'static str],
    pub ecological_functions: &'static [&'static str],
    pub planting_modes: &'static [&'static str],
    pub statuses: &'static [&'static str],
    pub plot_types: &'static [&'static str],
    pub plant_roles: &'static [&'static str],
    pub soil_types: &'static [&'static str],
}

#[must_use]
pub fn all_constants() -> Constants {
    Constants {
        strata: stratum::ALL,
        succession_stages: succession::ALL,
        ecological_functions: function::ALL,
        planting_modes: planting_mode::ALL,
        statuses: status::ALL,
        plot_types: plot_type::ALL,
        plant_roles: role::ALL,
        soil_types: soil_type::ALL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Category = (&'static [&'static str], fn(&str) -> bool);

    fn categories() -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        categories.push((stratum::ALL, stratum::is_valid));
        categories.push((succession::ALL, succession::is_valid));
        categories.push((function::ALL, function::is_valid));
        categories.push((planting_mode::ALL, planting_mode::is_valid));
        categories.push((status::ALL, status::is_valid));
        categories.push((plot_type::ALL, plot_type::is_valid));
        categories.push((role::ALL, role::is_valid));
        categories.push((soil_type::ALL, soil_type::is_valid));
        categories
    }

    #[test]
    fn test_every_listed_value_is_valid() {
        for (values, is_valid) in categories() {
            assert!(!values.is_empty());
            for value in values {
                assert!(is_valid(value), "{value} should be valid");
            }
        }
    }

    #[test]
    fn test_unlisted_values_are_rejected() {
        for (values, is_valid) in categories() {
            assert!(!is_valid(""));
            assert!(!is_valid("not-a-value"));
            for value in values {
                assert!(!is_valid(&value.to_uppercase()));
                assert!(!is_valid(&format!(" {value}")));
            }
        }
    }

    #[test]
    fn test_values_do_not_leak_across_categories() {
        assert!(!stratum::is_valid(succession::PIONEER));
        assert!(!plot_type::is_valid(stratum::LOW));
        assert!(!role::is_valid(status::PLANTED));
    }

    #[test]
    fn test_all_constants_payload() {
        let json = serde_json::to_value(all_constants()).unwrap();
        assert_eq!(json["strata"].as_array().unwrap().len(), 7);
        assert_eq!(json["succession_stages"].as_array().unwrap().len(), 4);
        assert_eq!(json["ecological_functions"].as_array().unwrap().len(), 14);
        assert_eq!(json["planting_modes"].as_array().unwrap().len(), 5);
        assert_eq!(json["statuses"].as_array().unwrap().len(), 8);
        assert_eq!(json["plot_types"][1], "island");
        assert_eq!(json["plant_roles"][0], "target");
        assert_eq!(json["soil_types"].as_array().unwrap().len(), 6);
    }
}
