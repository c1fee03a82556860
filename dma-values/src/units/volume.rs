//! Volumes in cubic, liquid and metric measures.

use once_cell::sync::Lazy;

use super::{UnitFamily, UnitKind, Units, load_builtin};

const DEFINITION: &str = "1/1 : Feet = 1/1 : cu ft : cubic foot|cubic feet, \
                          1/1728 : cu in : cubic inch|cubic inches. \
                          1/25 : Metric = 1/1 : cu m : cubic meter|cubic meters, \
                          1/1000 : cu dm : cubic decimeter|cubic decimeters. \
                          15/2 : Gallons = 1/1 : gallon|gallons, \
                          1/4 : quart|quarts, \
                          1/8 : pint|pints, \
                          1/16 : cup|cups, \
                          1/128 : ounce|ounces : oz. \
                          30/1 : Liters = 1/1 : l : liter|liters, \
                          1/10 : dl : deciliter|deciliters, \
                          1/100 : cl : centiliter|centiliters";

static FAMILY: Lazy<UnitFamily> = Lazy::new(|| load_builtin("volume", DEFINITION));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeKind;

impl UnitKind for VolumeKind {
    const NAME: &'static str = "volume";
    const SIMPLIFY_LEVEL: i64 = 5;

    fn family() -> &'static UnitFamily {
        &FAMILY
    }
}

pub type Volume = Units<VolumeKind>;

impl Volume {
    #[must_use]
    pub fn as_feet(&self) -> Self {
        self.converted(0, true)
    }

    #[must_use]
    pub fn as_metric(&self) -> Self {
        self.converted(1, true)
    }

    #[must_use]
    pub fn as_gallons(&self) -> Self {
        self.converted(2, true)
    }

    #[must_use]
    pub fn as_liters(&self) -> Self {
        self.converted(3, true)
    }
}
