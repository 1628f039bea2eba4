//! Canonical shift-record column names shared by the surrogates, the
//! optimizer, and the recommendation report.

/// Variables the optimizer can control (setpoint levers)
pub const CONTROLLABLE_VARS: [&str; 10] = [
    "avg_furnace_temperature_c",
    "oxygen_flow_rate",
    "charge_weight_tons",
    "scrap_ratio_pct",
    "iron_ore_ratio_pct",
    "alloy_addition_kg",
    "flux_addition_kg",
    "num_furnaces_running",
    "labor_count",
    "planned_runtime_hours",
];

/// Variables that are observed but cannot be optimized
pub const CONTEXT_VARS: [&str; 9] = [
    "ambient_temperature_c",
    "humidity_pct",
    "raw_material_quality_index",
    "moisture_content_pct",
    "power_supply_stability_index",
    "product_grade",
    "operator_experience_level",
    "maintenance_status",
    "grade_change_flag",
];

/// Continuous regression targets, one surrogate regressor each
pub const REGRESSION_TARGETS: [&str; 5] = [
    "yield_pct",
    "steel_output_tons",
    "energy_cost_usd",
    "production_cost_usd",
    "scrap_rate_pct",
];

/// Binary classification target: shift met the product grade
pub const QUALITY_PASS_TARGET: &str = "quality_grade_pass";

/// Binary classification target: shift output needed rework
pub const REWORK_TARGET: &str = "rework_required";

/// The only controllable lever reported as a whole number.
pub const FURNACE_COUNT_VAR: &str = "num_furnaces_running";

/// Outcome keys used by the composite score.
pub mod outcome {
    pub const YIELD_PCT: &str = "yield_pct";
    pub const STEEL_OUTPUT_TONS: &str = "steel_output_tons";
    pub const ENERGY_COST_USD: &str = "energy_cost_usd";
    pub const PRODUCTION_COST_USD: &str = "production_cost_usd";
    pub const SCRAP_RATE_PCT: &str = "scrap_rate_pct";
}
