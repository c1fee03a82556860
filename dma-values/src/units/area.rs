//! Surface areas.

use once_cell::sync::Lazy;

use super::{UnitFamily, UnitKind, Units, load_builtin};

const DEFINITION: &str = "1/1 : Feet = 9/1 : sq yd : square yard|square yards, \
                          1/1 : sq ft : square foot|square feet, \
                          1/144 : sq in : square inch|square inches. \
                          1/25 : Metric = 1/1 : sq m : square meter|square meters, \
                          1/100 : sq dm : square decimeter|square decimeters, \
                          1/10000 : sq cm : square centimeter|square centimeters";

static FAMILY: Lazy<UnitFamily> = Lazy::new(|| load_builtin("area", DEFINITION));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaKind;

impl UnitKind for AreaKind {
    const NAME: &'static str = "area";
    const SIMPLIFY_LEVEL: i64 = 5;

    fn family() -> &'static UnitFamily {
        &FAMILY
    }
}

pub type Area = Units<AreaKind>;

impl Area {
    #[must_use]
    pub fn as_feet(&self) -> Self {
        self.converted(0, true)
    }

    #[must_use]
    pub fn as_metric(&self) -> Self {
        self.converted(1, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_square_units() {
        let yard: Area = "1 sq yd".parse().unwrap();
        assert_eq!(yard.as_metric().to_string(), "36 sq dm");
        let meter: Area = "1 square meter".parse().unwrap();
        assert_eq!(meter.as_feet().to_string(), "2 sq yd 7 sq ft");
        let mixed: Area = "2 sq ft 72 sq in".parse().unwrap();
        assert_eq!(mixed.simplify().to_string(), "2 1/2 sq ft");
    }
}
