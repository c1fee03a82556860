//! Time spans in real time, combat rounds or actions.

use once_cell::sync::Lazy;

use super::{UnitFamily, UnitKind, Units, load_builtin};
use crate::rational::Rational;

const DEFINITION: &str = "1/1 : Seconds = 86400/1 : day|days, \
                          3600/1 : hour|hours : hr|hrs, \
                          60/1 : minute|minutes : min|mins, \
                          1/1 : second|seconds : sec|secs. \
                          1/6 : Rounds = 1/1 : round|rounds : rd|rds. \
                          1/6 : Actions = 1/1 : round|rounds : rd|rds, \
                          1/10 : standard action|standard actions, \
                          1/100 : move action|move actions, \
                          1/1000 : swift action|swift actions, \
                          1/10000 : free action|free actions";

static FAMILY: Lazy<UnitFamily> = Lazy::new(|| load_builtin("duration", DEFINITION));

pub const SECONDS: usize = 0;
pub const ROUNDS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationKind;

impl UnitKind for DurationKind {
    const NAME: &'static str = "duration";
    const SIMPLIFY_LEVEL: i64 = 5;

    fn family() -> &'static UnitFamily {
        &FAMILY
    }
}

pub type Duration = Units<DurationKind>;

impl Duration {
    #[must_use]
    pub fn rounds(value: i64) -> Self {
        Self::from_values(ROUNDS, &[Some(Rational::from_int(value))]).unwrap_or_default()
    }

    #[must_use]
    pub fn as_seconds(&self) -> Self {
        self.converted(SECONDS, true)
    }

    #[must_use]
    pub fn as_rounds(&self) -> Self {
        self.converted(ROUNDS, true)
    }

    #[must_use]
    pub fn as_seconds_value(&self) -> Rational {
        self.value_in(SECONDS)
    }

    #[must_use]
    pub fn as_rounds_value(&self) -> Rational {
        self.value_in(ROUNDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ParseReader;

    #[test]
    fn rounds_to_real_time() {
        let long = Duration::rounds(12033);
        assert_eq!(long.as_seconds().to_string(), "20 hours 3 minutes 18 seconds");
        assert_eq!(long.as_seconds_value().to_string(), "72198");
        assert_eq!(Duration::rounds(1).to_string(), "1 round");
    }

    #[test]
    fn real_time_to_rounds() {
        let minute: Duration = "1 min".parse().unwrap();
        assert_eq!(minute.as_rounds().to_string(), "10 rounds");
        assert_eq!(minute.as_rounds_value().to_string(), "10");
        let odd: Duration = "1 hour 4 secs".parse().unwrap();
        assert_eq!(odd.as_rounds().to_string(), "600 2/3 rounds");
    }

    #[test]
    fn actions_are_fractions_of_rounds() {
        let mut reader = ParseReader::new("1 round 1 standard action");
        let mixed = Duration::read(&mut reader).unwrap();
        assert_eq!(mixed.set_index(), Some(ROUNDS));
        assert_eq!(reader.rest(), " 1 standard action");
        let fine: Duration = "2 standard actions".parse().unwrap();
        assert_eq!(fine.set_index(), Some(2));
        assert_eq!(fine.as_rounds_value().to_string(), "1/5");
    }
}
