//! Dice notation: `count d sides [modifier]`, or a bare fixed number.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::{Result, ValueError};
use crate::numbers::narrow_i128;
use crate::rational::UNDEFINED;
use crate::reader::ParseReader;

/// Most dice a single expression may roll.
pub const MAX_COUNT: i64 = 10_000;
/// Most sides a single die may have.
pub const MAX_SIDES: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dice {
    count: i64,
    sides: i64,
    modifier: i64,
}

impl Dice {
    pub const UNDEFINED: Self = Self {
        count: 0,
        sides: 0,
        modifier: 0,
    };

    /// # Errors
    ///
    /// Returns [`ValueError::NotPositive`] for a negative count or sides, or
    /// for dice without sides, and [`ValueError::TooLarge`] past
    /// [`MAX_COUNT`] dice or [`MAX_SIDES`] sides.
    pub fn new(count: i64, sides: i64, modifier: i64) -> Result<Self> {
        if count < 0 {
            return Err(ValueError::NotPositive {
                field: "count",
                value: count,
            });
        }
        if sides <= 0 {
            return Err(ValueError::NotPositive {
                field: "sides",
                value: sides,
            });
        }
        if count > MAX_COUNT {
            return Err(ValueError::TooLarge {
                field: "count",
                max: MAX_COUNT,
                value: count,
            });
        }
        if sides > MAX_SIDES {
            return Err(ValueError::TooLarge {
                field: "sides",
                max: MAX_SIDES,
                value: sides,
            });
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// A fixed value without any dice.
    #[must_use]
    pub const fn fixed(value: i64) -> Self {
        Self {
            count: 0,
            sides: 1,
            modifier: value,
        }
    }

    #[must_use]
    pub const fn count(&self) -> i64 {
        self.count
    }

    #[must_use]
    pub const fn sides(&self) -> i64 {
        self.sides
    }

    #[must_use]
    pub const fn modifier(&self) -> i64 {
        self.modifier
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.sides > 0 || self.count > 0
    }

    #[must_use]
    pub const fn is_random(&self) -> bool {
        self.is_defined() && self.sides != 0 && self.sides != 1 && self.count != 0
    }

    #[must_use]
    pub fn min(&self) -> i64 {
        narrow_i128(i128::from(self.count) + i128::from(self.modifier)).max(1)
    }

    #[must_use]
    pub fn max(&self) -> i64 {
        narrow_i128(self.dice_max() + i128::from(self.modifier)).max(1)
    }

    #[must_use]
    pub fn average(&self) -> i64 {
        let dice = i128::from(self.count) * (i128::from(self.sides) + 1) / 2;
        narrow_i128(dice + i128::from(self.modifier)).max(1)
    }

    /// Highest sum of the dice alone.
    fn dice_max(&self) -> i128 {
        i128::from(self.count) * i128::from(self.sides)
    }

    /// Roll with the given random source; undefined dice roll 0.
    pub fn roll_with<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        if !self.is_defined() {
            return 0;
        }
        let mut total = self.modifier;
        if self.sides > 0 {
            for _ in 0..self.count.min(MAX_COUNT) {
                total = total.saturating_add(rng.gen_range(1..=self.sides));
            }
        }
        total.max(1)
    }

    /// Roll with the thread-local random source.
    #[must_use]
    pub fn roll(&self) -> i64 {
        self.roll_with(&mut rand::thread_rng())
    }

    /// Combine two dice expressions.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::IncompatibleDice`] when both sides roll dice with
    /// different numbers of sides.
    pub fn add(&self, other: &Self) -> Result<Self> {
        if !self.is_defined() {
            return Ok(*other);
        }
        if !other.is_defined() {
            return Ok(*self);
        }
        if self.count > 0 && other.count > 0 && self.sides != other.sides {
            return Err(ValueError::IncompatibleDice {
                left: self.sides,
                right: other.sides,
            });
        }

        let sides = if self.count > 0 {
            self.sides
        } else {
            other.sides
        };
        let sum = Self {
            count: capped_count(i128::from(self.count) + i128::from(other.count)),
            sides,
            modifier: 0,
        };
        let mut modifier = i128::from(self.modifier) + i128::from(other.modifier);
        if -modifier > sum.dice_max() {
            modifier = 1 - sum.dice_max();
        }
        Ok(Self {
            modifier: narrow_i128(modifier),
            ..sum
        })
    }

    /// Scale the number of dice and the modifier.
    #[must_use]
    pub fn multiply(&self, factor: i64) -> Self {
        if !self.is_defined() || factor < 0 {
            return *self;
        }
        Self {
            count: capped_count(i128::from(self.count) * i128::from(factor)),
            sides: self.sides,
            modifier: self.modifier.saturating_mul(factor),
        }
    }

    /// Read `INT 'd' INT [SIGNED_INT] | SIGNED_INT`.
    pub fn read(reader: &mut ParseReader<'_>) -> Option<Self> {
        let start = reader.position();
        let first = reader.read_int()?;
        if !reader.expect_char('d') {
            return Some(Self::fixed(first));
        }

        let dice = (first > 0)
            .then(|| reader.read_int())
            .flatten()
            .and_then(|sides| Self::new(first, sides, 0).ok())
            .map(|dice| Self {
                modifier: reader.read_int().unwrap_or(0),
                ..dice
            });
        if dice.is_none() {
            reader.seek(start);
        }
        dice
    }
}

fn capped_count(count: i128) -> i64 {
    if count > i128::from(MAX_COUNT) {
        log::warn!("capping {count} dice at {MAX_COUNT}");
        return MAX_COUNT;
    }
    narrow_i128(count)
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_defined() {
            return f.write_str(UNDEFINED);
        }
        if self.count == 0 {
            return write!(f, "{}", self.modifier);
        }
        if self.sides == 1 {
            return write!(f, "{}", self.count.saturating_add(self.modifier));
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, " +{m}"),
            m => write!(f, " {m}"),
        }
    }
}

impl FromStr for Dice {
    type Err = ValueError;

    fn from_str(text: &str) -> Result<Self> {
        let mut reader = ParseReader::new(text);
        match Self::read(&mut reader) {
            Some(dice) if reader.rest().trim().is_empty() => Ok(dice),
            _ => Err(ValueError::Parse {
                kind: "dice",
                text: text.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn display_forms() {
        assert_eq!(Dice::new(1, 6, 2).unwrap().to_string(), "1d6 +2");
        assert_eq!(Dice::new(1, 6, -2).unwrap().to_string(), "1d6 -2");
        assert_eq!(Dice::new(3, 12, 0).unwrap().to_string(), "3d12");
        assert_eq!(Dice::fixed(3).to_string(), "3");
        assert_eq!(Dice::fixed(-5).to_string(), "-5");
        assert_eq!(Dice::new(4, 1, 0).unwrap().to_string(), "4");
        assert_eq!(Dice::fixed(0).to_string(), "0");
        assert_eq!(Dice::UNDEFINED.to_string(), UNDEFINED);
    }

    #[test]
    fn bounds_are_floored_at_one() {
        let dice = Dice::new(1, 6, -2).unwrap();
        assert_eq!(dice.min(), 1);
        assert_eq!(dice.max(), 4);
        assert_eq!(dice.average(), 1);

        let big = Dice::new(3, 8, 2).unwrap();
        assert_eq!((big.min(), big.max(), big.average()), (5, 26, 15));
    }

    #[test]
    fn randomness_flags() {
        assert!(Dice::new(1, 6, 0).unwrap().is_random());
        assert!(!Dice::fixed(4).is_random());
        assert!(!Dice::new(3, 1, 0).unwrap().is_random());
        assert!(!Dice::UNDEFINED.is_random());
    }

    #[test]
    fn rolls_stay_within_bounds() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let dice = Dice::new(2, 6, -4).unwrap();
        for _ in 0..1000 {
            let roll = dice.roll_with(&mut rng);
            assert!((1..=8).contains(&roll), "rolled {roll}");
        }
    }

    #[test]
    fn single_die_is_roughly_uniform() {
        let mut rng = ChaCha20Rng::seed_from_u64(0x00C0_FFEE);
        let dice = Dice::new(1, 10, 0).unwrap();
        let rolls = 10_000;
        let mut buckets = [0_u32; 10];
        for _ in 0..rolls {
            let roll = dice.roll_with(&mut rng);
            buckets[usize::try_from(roll - 1).unwrap()] += 1;
        }
        for (face, hits) in buckets.iter().enumerate() {
            let share = f64::from(*hits) / f64::from(rolls);
            assert!((share - 0.1).abs() < 0.03, "face {} share {share}", face + 1);
        }
    }

    #[test]
    fn add_combines_matching_dice() {
        let a = Dice::new(1, 6, 2).unwrap();
        let b = Dice::new(2, 6, -1).unwrap();
        assert_eq!(a.add(&b).unwrap().to_string(), "3d6 +1");
        assert_eq!(Dice::fixed(2).add(&b).unwrap().to_string(), "2d6 +1");
        assert_eq!(Dice::UNDEFINED.add(&a).unwrap(), a);
        assert_eq!(
            a.add(&Dice::new(1, 8, 0).unwrap()),
            Err(ValueError::IncompatibleDice { left: 6, right: 8 })
        );
    }

    #[test]
    fn add_clamps_negative_modifier() {
        let dice = Dice::new(1, 4, 0).unwrap();
        let sum = dice.add(&Dice::fixed(-10)).unwrap();
        assert_eq!(sum.modifier(), -3);
        assert_eq!(sum.min(), 1);
    }

    #[test]
    fn oversized_dice_are_rejected() {
        assert!(matches!(
            "4000000000d4000000000".parse::<Dice>(),
            Err(ValueError::Parse { .. })
        ));
        assert_eq!(
            Dice::new(MAX_COUNT + 1, 6, 0),
            Err(ValueError::TooLarge {
                field: "count",
                max: MAX_COUNT,
                value: MAX_COUNT + 1
            })
        );
        assert!(matches!(
            Dice::new(1, MAX_SIDES + 1, 0),
            Err(ValueError::TooLarge { field: "sides", .. })
        ));
    }

    #[test]
    fn extreme_values_saturate() {
        let dice = Dice::new(MAX_COUNT, MAX_SIDES, i64::MAX).unwrap();
        assert_eq!(dice.max(), i64::MAX);
        assert_eq!(dice.average(), i64::MAX);
        assert_eq!(Dice::fixed(i64::MIN).min(), 1);
        assert_eq!(dice.multiply(i64::MAX).count(), MAX_COUNT);
        let doubled = dice.add(&dice).unwrap();
        assert_eq!(doubled.count(), MAX_COUNT);
        assert_eq!(doubled.modifier(), i64::MAX);

        let mut rng = ChaCha20Rng::seed_from_u64(3);
        assert_eq!(dice.roll_with(&mut rng), i64::MAX);
    }

    #[test]
    fn read_cases() {
        let cases: [(&str, Option<&str>, &str); 9] = [
            ("\n 2 \n d 8 \n -2 ", Some("2d8 -2"), " "),
            ("1d6", Some("1d6"), ""),
            ("3d4 +2 rest", Some("3d4 +2"), " rest"),
            ("+3", Some("3"), ""),
            ("1e5 +2", Some("1"), "e5 +2"),
            ("1min", Some("1"), "min"),
            ("-1d3 +3", None, "-1d3 +3"),
            ("1d-3 -2", None, "1d-3 -2"),
            ("a", None, "a"),
        ];
        for (input, expected, rest) in cases {
            let mut reader = ParseReader::new(input);
            let dice = Dice::read(&mut reader);
            assert_eq!(dice.map(|d| d.to_string()).as_deref(), expected, "{input:?}");
            assert_eq!(reader.rest(), rest, "rest of {input:?}");
        }
        assert!("2d".parse::<Dice>().is_err());
        assert_eq!("2d10 +1".parse::<Dice>().unwrap().max(), 21);
    }
}
