/// Capital recovery factor `r / (1 - (1 + r)^-n)`.
///
/// Converts a present value into `n` equal annual payments. At `r = 0` the
/// limit `1 / n` is returned.
///
/// Returns `None` when `years` is zero.
///
/// ```
/// use energy_planning::economics::annuity_factor;
///
/// let e = annuity_factor(0.085, 20).unwrap();
/// assert!((e - 0.10567).abs() < 1e-5);
/// assert_eq!(annuity_factor(0.0, 4), Some(0.25));
/// assert_eq!(annuity_factor(0.05, 0), None);
/// ```
pub fn annuity_factor(rate: f64, years: u32) -> Option<f64> {
    if years == 0 {
        return None;
    }
    let n = f64::from(years);
    if rate == 0.0 {
        return Some(1.0 / n);
    }
    Some(rate / (1.0 - (1.0 + rate).powf(-n)))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn course_rate() {
        assert_relative_eq!(
            annuity_factor(0.085, 20).unwrap(),
            0.105_670_974_357_748_9,
            max_relative = 1e-12
        );
    }

    #[test]
    fn single_year_repays_with_interest() {
        assert_relative_eq!(annuity_factor(0.1, 1).unwrap(), 1.1, max_relative = 1e-12);
    }

    #[test]
    fn tends_to_one_over_n_near_zero_rate() {
        let near = annuity_factor(1e-9, 20).unwrap();
        assert_relative_eq!(near, annuity_factor(0.0, 20).unwrap(), max_relative = 1e-6);
    }

    #[test]
    fn shorter_horizon_has_larger_factor() {
        let e5 = annuity_factor(0.085, 5).unwrap();
        let e15 = annuity_factor(0.085, 15).unwrap();
        assert!(e5 > e15);
    }

    #[test]
    fn zero_years_is_undefined() {
        assert_eq!(annuity_factor(0.085, 0), None);
    }
}
