//! Weights in pounds, metric units or carats.

use once_cell::sync::Lazy;

use super::{UnitFamily, UnitKind, Units, load_builtin};
use crate::rational::Rational;

const DEFINITION: &str = "1/1 : Pounds = 1/1 : lb|lbs : pounds|pound, \
                          1/16 : oz : ounces|ounce. \
                          1/2 : Metric = 1000/1 : t : tons|ton, \
                          1/1 : kg : kilo|kilos|kilograms|kilogram, \
                          1/1000 : g : grams|gram. \
                          2500/1 : Carat = 1/1 : ct : carats|carat";

static FAMILY: Lazy<UnitFamily> = Lazy::new(|| load_builtin("weight", DEFINITION));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeightKind;

impl UnitKind for WeightKind {
    const NAME: &'static str = "weight";
    const SIMPLIFY_LEVEL: i64 = 5;

    fn family() -> &'static UnitFamily {
        &FAMILY
    }
}

pub type Weight = Units<WeightKind>;

impl Weight {
    #[must_use]
    pub fn pounds(value: &Rational) -> Self {
        Self::from_values(0, &[Some(*value), None]).unwrap_or_default()
    }

    #[must_use]
    pub fn as_pounds(&self) -> Self {
        self.converted(0, true)
    }

    #[must_use]
    pub fn as_metric(&self) -> Self {
        self.converted(1, true)
    }

    #[must_use]
    pub fn as_carats(&self) -> Self {
        self.converted(2, true)
    }
}
