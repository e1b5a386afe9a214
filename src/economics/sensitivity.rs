//! One-parameter sensitivity sweeps of the maximum initial payment.

use super::payment::{PaymentCase, max_initial_payment};

/// `n` evenly spaced values from `start` to `end`, both included.
///
/// ```
/// use energy_planning::economics::linspace;
///
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
/// assert!(linspace(0.0, 1.0, 0).is_empty());
/// ```
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Maximum initial payment as a function of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    /// Column name used in CSV output.
    pub parameter: &'static str,
    /// Axis label.
    pub label: String,
    /// Chart caption.
    pub title: String,
    /// `(parameter value, maximum payment)` pairs in sweep order.
    pub points: Vec<(f64, f64)>,
}

impl Sweep {
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(_, y)| y)
    }
}

/// Varies the growth `x` of successive reinvestments.
pub fn sweep_reinvestment(case: &PaymentCase, xs: &[f64]) -> Option<Sweep> {
    let reference = case.reference_cost()?;
    let points = xs
        .iter()
        .map(|&x| {
            let schedule = case.schedule.with_growth(x);
            max_initial_payment(reference, case.rate, case.lifetime_years, &schedule)
                .map(|f| (x, f))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Sweep {
        parameter: "reinvestment_x",
        label: "x (Multiplier for Additional Component)".to_string(),
        title: "Additional component sensitivity".to_string(),
        points,
    })
}

/// Varies the discount rate. The reference cost stays at the base rate.
pub fn sweep_discount_rate(case: &PaymentCase, rates: &[f64]) -> Option<Sweep> {
    let reference = case.reference_cost()?;
    let points = rates
        .iter()
        .map(|&r| {
            max_initial_payment(reference, r, case.lifetime_years, &case.schedule).map(|f| (r, f))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Sweep {
        parameter: "discount_rate",
        label: "r (Discount rate)".to_string(),
        title: "Discount rate sensitivity".to_string(),
        points,
    })
}

/// Varies the peak tariff, recomputing the reference cost at each price.
pub fn sweep_peak_price(case: &PaymentCase, prices: &[f64]) -> Option<Sweep> {
    let points = prices
        .iter()
        .map(|&p| {
            let priced = PaymentCase {
                feeder: case.feeder.with_peak_price(p),
                ..case.clone()
            };
            priced.max_payment().map(|f| (p, f))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Sweep {
        parameter: "peak_price_nok_per_mwh",
        label: "Peak price in NOK/MWh".to_string(),
        title: "Peak price sensitivity".to_string(),
        points,
    })
}
