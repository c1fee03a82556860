//! Lengths in feet/miles or metric units.

use std::cmp::Ordering;

use once_cell::sync::Lazy;

use super::{UnitFamily, UnitKind, Units, load_builtin};
use crate::rational::{Rational, UNDEFINED};

const DEFINITION: &str = "1/1 : Feet = 5280/1 : mi : mile|miles, \
                          1/1 : ft : foot|feet, \
                          1/12 : in : inch|inches. \
                          2/5 : Metric = 1000/1 : km : kilometer|kilometers, \
                          1/1 : m : meter|meters, \
                          1/100 : cm : centimeter|centimeters";

static FAMILY: Lazy<UnitFamily> = Lazy::new(|| load_builtin("distance", DEFINITION));

pub const FEET: usize = 0;
pub const METRIC: usize = 1;

/// Size buckets as `(feet numerator, feet denominator, label)`; a distance
/// belongs to the first bucket it does not exceed.
const GROUPS: [(i64, i64, &str); 25] = [
    (1, 120, "1/10 in"),
    (1, 48, "1/4 in"),
    (1, 24, "1/2 in"),
    (1, 12, "1 in"),
    (1, 6, "2 in"),
    (1, 4, "3 in"),
    (1, 3, "4 in"),
    (5, 12, "5 in"),
    (5, 6, "10 in"),
    (1, 1, "1 ft"),
    (5, 1, "5 ft"),
    (10, 1, "10 ft"),
    (25, 1, "25 ft"),
    (50, 1, "50 ft"),
    (100, 1, "100 ft"),
    (250, 1, "250 ft"),
    (500, 1, "500 ft"),
    (1000, 1, "1000 ft"),
    (5280, 1, "1 ml"),
    (2 * 5280, 1, "2 ml"),
    (5 * 5280, 1, "5 ml"),
    (10 * 5280, 1, "10 ml"),
    (25 * 5280, 1, "25 ml"),
    (50 * 5280, 1, "50 ml"),
    (100 * 5280, 1, "100 ml"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistanceKind;

impl UnitKind for DistanceKind {
    const NAME: &'static str = "distance";
    const SIMPLIFY_LEVEL: i64 = 3;

    fn family() -> &'static UnitFamily {
        &FAMILY
    }
}

pub type Distance = Units<DistanceKind>;

impl Distance {
    #[must_use]
    pub fn feet(value: i64) -> Self {
        Self::from_values(FEET, &[None, Some(Rational::from_int(value)), None])
            .unwrap_or_default()
    }

    #[must_use]
    pub fn meters(value: i64) -> Self {
        Self::from_values(METRIC, &[None, Some(Rational::from_int(value)), None])
            .unwrap_or_default()
    }

    #[must_use]
    pub fn as_feet(&self) -> Self {
        self.converted(FEET, true)
    }

    #[must_use]
    pub fn as_metric(&self) -> Self {
        self.converted(METRIC, true)
    }

    /// Total length in feet.
    #[must_use]
    pub fn as_feet_value(&self) -> Rational {
        self.value_in(FEET)
    }

    /// Total length in meters.
    #[must_use]
    pub fn as_meters_value(&self) -> Rational {
        self.value_in(METRIC)
    }

    /// Coarse size label used to group similar distances.
    #[must_use]
    pub fn group(&self) -> &'static str {
        if !self.is_defined() {
            return UNDEFINED;
        }
        let feet = self.as_feet_value();
        GROUPS
            .iter()
            .find(|(nominator, denominator, _)| {
                feet.multiply_int(*denominator).compare_int(*nominator) != Ordering::Greater
            })
            .map_or("Infinite", |(_, _, label)| label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Distance {
        text.parse().unwrap()
    }

    #[test]
    fn builtin_family_is_valid() {
        assert_eq!(DistanceKind::family().sets().len(), 2);
        assert_eq!(parse("3 ft").base_unit(), "ft");
    }

    #[test]
    fn converts_between_systems() {
        assert_eq!(parse("5 mi").as_metric().to_string(), "10 km 560 m");
        assert_eq!(parse("20 km").as_feet().to_string(), "9 mi 2480 ft");
        assert_eq!(parse("1 mi").as_feet_value().to_string(), "5280");
        assert_eq!(parse("1 km").as_meters_value().to_string(), "1000");
        assert_eq!(Distance::meters(2).as_feet_value().to_string(), "5");
    }

    #[test]
    fn reading_merges_units() {
        let ordered = parse("1 km 5 m 40 cm");
        let scattered = parse("30 cm 5 m 10 cm 1 km");
        assert_eq!(ordered, scattered);
        assert_eq!(scattered.to_string(), "1 km 5 m 40 cm");
        assert_eq!(parse("2 miles 3 feet").to_string(), "2 mi 3 ft");
        assert!("3 furlongs".parse::<Distance>().is_err());
    }

    #[test]
    fn groups_by_size() {
        assert_eq!(parse("1 in").group(), "1 in");
        assert_eq!(parse("3 ft").group(), "5 ft");
        assert_eq!(Distance::feet(5).group(), "5 ft");
        assert_eq!(parse("2 mi").group(), "2 ml");
        assert_eq!(parse("200 mi").group(), "Infinite");
        assert_eq!(parse("1 m").group(), "5 ft");
        assert_eq!(Distance::undefined().group(), UNDEFINED);
    }
}
