//! Generation technologies and their hourly capacity limits.

use serde::Deserialize;

/// Hourly production limit of a generation mode (MW).
///
/// TOML accepts a number (constant limit), a list (one value per hour), or the
/// string `"unlimited"`.
///
/// # Examples
///
/// ```
/// use energy_planning::modes::Capacity;
///
/// let wind = Capacity::Hourly(vec![32.0, 51.0, 19.0]);
/// assert_eq!(wind.at(1), 51.0);
/// assert_eq!(wind.at(5), 0.0);
/// assert_eq!(Capacity::Constant(120.0).at(23), 120.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CapacityRepr")]
pub enum Capacity {
    /// Same limit every hour.
    Constant(f64),
    /// One limit per hour. Scenario validation requires one value per demand hour;
    /// `at` reports zero past the end of the list.
    Hourly(Vec<f64>),
    /// No upper bound.
    Unlimited,
}

impl Capacity {
    /// Returns the production limit for `hour`.
    pub fn at(&self, hour: usize) -> f64 {
        match self {
            Self::Constant(mw) => *mw,
            Self::Hourly(profile) => profile.get(hour).copied().unwrap_or(0.0),
            Self::Unlimited => f64::INFINITY,
        }
    }

    /// Returns `true` when the limit changes from hour to hour.
    pub fn is_hourly(&self) -> bool {
        matches!(self, Self::Hourly(_))
    }

    /// Smallest limit found in the first `hours` hours, used for validation.
    pub(crate) fn min_over(&self, hours: usize) -> f64 {
        (0..hours.max(1))
            .map(|h| self.at(h))
            .fold(f64::INFINITY, f64::min)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CapacityRepr {
    Number(f64),
    List(Vec<f64>),
    Word(String),
}

impl TryFrom<CapacityRepr> for Capacity {
    type Error = String;

    fn try_from(repr: CapacityRepr) -> Result<Self, Self::Error> {
        match repr {
            CapacityRepr::Number(mw) => Ok(Self::Constant(mw)),
            CapacityRepr::List(profile) => Ok(Self::Hourly(profile)),
            CapacityRepr::Word(word) if word == "unlimited" => Ok(Self::Unlimited),
            CapacityRepr::Word(word) => Err(format!(
                "expected a number, a list of numbers, or \"unlimited\", got \"{word}\""
            )),
        }
    }
}

fn default_max_units() -> u32 {
    1
}

/// A generation technology with its cost and emission parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mode {
    /// Display name, also used as CSV column and chart legend.
    pub name: String,
    /// Cost charged every hour for every installed unit, whatever its output.
    pub fixed_cost: f64,
    /// Cost per MWh produced.
    pub variable_cost: f64,
    /// Production limit per unit (MW).
    pub capacity: Capacity,
    /// Emissions in tonnes of CO2 per MWh produced.
    #[serde(default)]
    pub co2_per_mwh: f64,
    /// Upper bound on the installed unit count (unit sizing only).
    #[serde(default = "default_max_units")]
    pub max_units: u32,
    /// Chart colour as `#rrggbb`.
    #[serde(default)]
    pub color: Option<String>,
}

impl Mode {
    /// Creates a mode with a constant capacity, no emissions, and a single unit.
    pub fn new(name: &str, fixed_cost: f64, variable_cost: f64, capacity: Capacity) -> Self {
        Self {
            name: name.to_string(),
            fixed_cost,
            variable_cost,
            capacity,
            co2_per_mwh: 0.0,
            max_units: 1,
            color: None,
        }
    }

    /// Sets the emission factor (t/MWh).
    #[must_use]
    pub fn with_co2(mut self, co2_per_mwh: f64) -> Self {
        self.co2_per_mwh = co2_per_mwh;
        self
    }

    /// Sets the maximum unit count.
    #[must_use]
    pub fn with_max_units(mut self, max_units: u32) -> Self {
        self.max_units = max_units;
        self
    }

    /// Sets the chart colour.
    #[must_use]
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Cost of one more MWh including the carbon price.
    pub fn marginal_cost(&self, co2_price: f64) -> f64 {
        self.variable_cost + co2_price * self.co2_per_mwh
    }

    /// Production limit at `hour` for one unit.
    pub fn limit(&self, hour: usize) -> f64 {
        self.capacity.at(hour)
    }

    /// Emission-free modes driven by an hourly resource profile (wind, solar).
    pub fn is_renewable(&self) -> bool {
        self.co2_per_mwh == 0.0 && self.capacity.is_hourly()
    }
}
