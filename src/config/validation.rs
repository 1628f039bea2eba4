//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::AdvisorConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path for `AdvisorConfig`.
///
/// Entries of `[[search_space]]` share the `search_space.` prefix. Keep in
/// sync with advisor_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [artifacts]
        "artifacts",
        "artifacts.dir",
        // [optimizer]
        "optimizer",
        "optimizer.n_trials",
        "optimizer.n_startup_trials",
        "optimizer.seed",
        // [sampler]
        "sampler",
        "sampler.n_ei_candidates",
        "sampler.max_good_trials",
        "sampler.good_fraction",
        // [objective]
        "objective",
        "objective.quality_pass_threshold",
        "objective.quality_penalty",
        "objective.weights",
        "objective.weights.yield_pct",
        "objective.weights.steel_output_tons",
        "objective.weights.energy_cost_usd",
        "objective.weights.scrap_rate_pct",
        "objective.normalization",
        "objective.normalization.yield_pct",
        "objective.normalization.steel_output_tons",
        "objective.normalization.energy_cost_usd",
        "objective.normalization.scrap_rate_pct",
        // [[search_space]]
        "search_space",
        "search_space.name",
        "search_space.low",
        "search_space.high",
        "search_space.rounding",
        "search_space.rounding.decimals",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`. Arrays
/// of tables contribute their members' keys under the array's own path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for key in walk_toml_keys(item, &path) {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3. Ties go to the
/// lexicographically smallest key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails; parse errors surface later from serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed config.
///
/// Returns (errors, warnings). Errors are values the optimizer cannot run
/// with; warnings are legal but probably unintended.
pub fn validate_ranges(config: &AdvisorConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let opt = &config.optimizer;
    if opt.n_trials == 0 {
        errors.push("optimizer.n_trials must be > 0".to_string());
    }
    if opt.n_startup_trials >= opt.n_trials && opt.n_trials > 0 {
        warnings.push(ValidationWarning {
            field: "optimizer.n_startup_trials".to_string(),
            message: format!(
                "optimizer.n_startup_trials = {} >= n_trials = {}; \
                 every trial will be uniform random",
                opt.n_startup_trials, opt.n_trials
            ),
            suggestion: None,
        });
    }

    let s = &config.sampler;
    if s.n_ei_candidates == 0 {
        errors.push("sampler.n_ei_candidates must be > 0".to_string());
    }
    if s.max_good_trials == 0 {
        errors.push("sampler.max_good_trials must be > 0".to_string());
    }
    if !(s.good_fraction.is_finite() && s.good_fraction > 0.0 && s.good_fraction <= 1.0) {
        errors.push(format!(
            "sampler.good_fraction = {} must be in (0, 1]",
            s.good_fraction
        ));
    }

    let obj = &config.objective;
    let threshold = obj.quality_pass_threshold;
    if !(threshold.is_finite() && (0.0..=1.0).contains(&threshold)) {
        errors.push(format!(
            "objective.quality_pass_threshold = {} must be in [0, 1]",
            obj.quality_pass_threshold
        ));
    }
    if !obj.quality_penalty.is_finite() || obj.quality_penalty < 0.0 {
        errors.push(format!(
            "objective.quality_penalty = {} must be finite and >= 0",
            obj.quality_penalty
        ));
    }
    for (name, w) in obj.weights.entries() {
        if !w.is_finite() || w < 0.0 {
            errors.push(format!("objective.weights.{name} = {w} must be finite and >= 0"));
        }
    }
    for (name, n) in obj.normalization.entries() {
        // used as divisor
        if !n.is_finite() || n <= 0.0 {
            errors.push(format!("objective.normalization.{name} = {n} must be > 0"));
        }
    }
    let weight_sum: f64 = obj.weights.entries().iter().map(|(_, w)| w).sum();
    if weight_sum.is_finite() && (weight_sum - 1.0).abs() > 0.01 {
        warnings.push(ValidationWarning {
            field: "objective.weights".to_string(),
            message: format!("objective weights sum to {weight_sum:.3}, expected 1.0"),
            suggestion: None,
        });
    }

    errors.extend(
        config
            .search_space
            .problems()
            .into_iter()
            .map(|p| format!("search_space.{p}")),
    );

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
