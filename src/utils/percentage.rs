use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0.round())
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);

    /// Only values in `[0, 100]` are percentages. NaN is rejected as well.
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if (0.0..=100.0).contains(&value) {
            Some(Percentage(value))
        } else {
            None
        }
    }

    /// Share of `part` in `whole`. An empty whole is 0% so callers never divide by zero.
    pub fn of(part: usize, whole: usize) -> Percentage {
        if whole == 0 {
            return Percentage::ZERO;
        }
        let part = part.min(whole);
        Percentage(part as f64 / whole as f64 * 100.)
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Percentage;

    #[test]
    fn empty_whole_is_zero() {
        assert_eq!(Percentage::of(3, 0), Percentage::ZERO);
    }

    #[test]
    fn share_is_scaled_to_hundred() {
        assert_eq!(*Percentage::of(1, 4), 25.);
        assert_eq!(*Percentage::of(2, 2), 100.);
        assert_eq!(Percentage::of(1, 3).to_string(), "33%");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(Percentage::new_opt(-0.5).is_none());
        assert!(Percentage::new_opt(100.5).is_none());
        assert!(Percentage::new_opt(f64::NAN).is_none());
        assert!(Percentage::new_opt(50.).is_some());
    }
}
