//! Bounded controllable-variable search space

use serde::{Deserialize, Serialize};

use crate::types::variables::FURNACE_COUNT_VAR;
use crate::types::Setpoints;

/// Finest decimal rounding an `f64` can carry without the scale overflowing.
pub const MAX_DECIMAL_PLACES: u32 = 15;

/// How a dimension's value is reported once the search finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Nearest whole number (counts of furnaces, crews, ...)
    Integer,
    /// Fixed number of decimal places
    Decimals(u32),
}

impl Default for Rounding {
    fn default() -> Self {
        Self::Decimals(3)
    }
}

impl Rounding {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Integer => value.round(),
            Self::Decimals(places) => {
                let scale = 10f64.powi(places as i32);
                (value * scale).round() / scale
            }
        }
    }
}

/// One controllable lever and its inclusive bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDimension {
    pub name: String,
    pub low: f64,
    pub high: f64,
    #[serde(default)]
    pub rounding: Rounding,
}

impl SearchDimension {
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
            rounding: Rounding::default(),
        }
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Round per policy, then pull back inside the bounds.
    pub fn finalize(&self, value: f64) -> f64 {
        let rounded = self.rounding.apply(value);
        match self.rounding {
            Rounding::Integer => rounded.clamp(self.low.ceil(), self.high.floor()),
            Rounding::Decimals(_) => rounded.clamp(self.low, self.high),
        }
    }
}

/// Ordered set of search dimensions. Trial parameter vectors are aligned
/// with this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSpace(Vec<SearchDimension>);

impl SearchSpace {
    pub fn new(dimensions: Vec<SearchDimension>) -> Self {
        Self(dimensions)
    }

    /// The ten melt-shop levers with their operating limits.
    pub fn steel_plant() -> Self {
        Self(vec![
            SearchDimension::new("avg_furnace_temperature_c", 1400.0, 1700.0),
            SearchDimension::new("oxygen_flow_rate", 500.0, 3000.0),
            SearchDimension::new("charge_weight_tons", 50.0, 300.0),
            SearchDimension::new("scrap_ratio_pct", 10.0, 60.0),
            SearchDimension::new("iron_ore_ratio_pct", 10.0, 60.0),
            SearchDimension::new("alloy_addition_kg", 0.0, 500.0),
            SearchDimension::new("flux_addition_kg", 0.0, 800.0),
            SearchDimension::new(FURNACE_COUNT_VAR, 1.0, 6.0).with_rounding(Rounding::Integer),
            SearchDimension::new("labor_count", 20.0, 100.0),
            SearchDimension::new("planned_runtime_hours", 4.0, 12.0),
        ])
    }

    pub fn dimensions(&self) -> &[SearchDimension] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|d| d.name.as_str())
    }

    /// Structural problems, one message per offending dimension.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.0.is_empty() {
            problems.push("search space has no dimensions".to_string());
        }
        for (i, dim) in self.0.iter().enumerate() {
            if !dim.low.is_finite() || !dim.high.is_finite() {
                problems.push(format!("{}: bounds must be finite", dim.name));
            } else if dim.low >= dim.high {
                problems.push(format!(
                    "{}: low ({}) must be below high ({})",
                    dim.name, dim.low, dim.high
                ));
            } else if dim.rounding == Rounding::Integer && dim.low.ceil() > dim.high.floor() {
                problems.push(format!(
                    "{}: integer dimension has no whole value in bounds",
                    dim.name
                ));
            }
            if let Rounding::Decimals(places) = dim.rounding {
                if places > MAX_DECIMAL_PLACES {
                    problems.push(format!(
                        "{}: rounding to {places} decimals exceeds {MAX_DECIMAL_PLACES}",
                        dim.name
                    ));
                }
            }
            if self.0[..i].iter().any(|d| d.name == dim.name) {
                problems.push(format!("{}: duplicate dimension", dim.name));
            }
        }
        problems
    }

    /// Raw proposal map, no rounding.
    pub fn to_setpoints(&self, params: &[f64]) -> Setpoints {
        self.0
            .iter()
            .zip(params)
            .map(|(d, v)| (d.name.clone(), *v))
            .collect()
    }

    /// Reported setpoints: each value rounded and clamped per dimension.
    pub fn finalize(&self, params: &[f64]) -> Setpoints {
        self.0
            .iter()
            .zip(params)
            .map(|(d, v)| (d.name.clone(), d.finalize(*v)))
            .collect()
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::steel_plant()
    }
}
