//! Multi-unit amounts such as `1 mi 2480 ft`.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use smallvec::smallvec;

use super::{Slots, UnitFamily, UnitSet};
use crate::error::{Result, ValueError};
use crate::rational::{Rational, UNDEFINED};
use crate::reader::ParseReader;

/// Ties a [`Units`] value to its static unit family.
pub trait UnitKind: fmt::Debug + Clone + Copy + PartialEq + Eq + Default + 'static {
    /// Name of the kind of measurement, e.g. `"distance"`.
    const NAME: &'static str;

    /// Default denominator threshold used when simplifying.
    const SIMPLIFY_LEVEL: i64;

    fn family() -> &'static UnitFamily;
}

/// An amount spread over the units of one set of the kind's family.
///
/// Every slot corresponds to a unit of the active set; an empty slot means
/// "not given", which is different from an explicit zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Units<K: UnitKind> {
    set: Option<usize>,
    values: Slots,
    level: i64,
    kind: PhantomData<K>,
}

impl<K: UnitKind> Default for Units<K> {
    fn default() -> Self {
        Self {
            set: None,
            values: Slots::new(),
            level: K::SIMPLIFY_LEVEL,
            kind: PhantomData,
        }
    }
}

impl<K: UnitKind> Units<K> {
    #[must_use]
    pub fn undefined() -> Self {
        Self::default()
    }

    /// Amounts for the units of set `set`, largest unit first.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownSet`] for an invalid set index and
    /// [`ValueError::SlotMismatch`] when the number of values differs from the
    /// number of units in the set.
    pub fn from_values(set: usize, values: &[Option<Rational>]) -> Result<Self> {
        let family = K::family();
        let unit_set = family.set(set).ok_or(ValueError::UnknownSet {
            index: set,
            len: family.sets().len(),
        })?;
        if values.len() != unit_set.len() {
            return Err(ValueError::SlotMismatch {
                kind: K::NAME,
                set: unit_set.name().to_string(),
                given: values.len(),
                expected: unit_set.len(),
            });
        }
        Ok(Self {
            set: Some(set),
            values: values.iter().copied().collect(),
            level: K::SIMPLIFY_LEVEL,
            kind: PhantomData,
        })
    }

    /// Like [`Self::from_values`] with the set given by name.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::from_values`]; an unknown name is reported as an
    /// out of range set.
    pub fn in_set(set: &str, values: &[Option<Rational>]) -> Result<Self> {
        let family = K::family();
        let index = family.index_of(set).ok_or(ValueError::UnknownSet {
            index: family.sets().len(),
            len: family.sets().len(),
        })?;
        Self::from_values(index, values)
    }

    /// Same value with a different simplification threshold.
    #[must_use]
    pub fn with_level(mut self, level: i64) -> Self {
        self.level = level.max(1);
        self
    }

    #[must_use]
    pub const fn level(&self) -> i64 {
        self.level
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.set.is_some()
    }

    #[must_use]
    pub const fn set_index(&self) -> Option<usize> {
        self.set
    }

    #[must_use]
    pub fn active_set(&self) -> Option<&'static UnitSet> {
        self.set.and_then(|index| K::family().set(index))
    }

    #[must_use]
    pub fn values(&self) -> &[Option<Rational>] {
        &self.values
    }

    /// The amount stored for unit `index` of the active set.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Rational> {
        self.values.get(index).copied().flatten()
    }

    /// Plural name of the active set's base unit.
    #[must_use]
    pub fn base_unit(&self) -> &str {
        self.active_set()
            .map_or(UNDEFINED, |set| set.base_unit().plural())
    }

    /// Total in the active set's base unit.
    #[must_use]
    pub fn as_base(&self) -> Rational {
        self.active_set()
            .map_or(Rational::UNDEFINED, |set| set.as_base(&self.values))
    }

    /// Total on the family's common scale.
    #[must_use]
    pub fn normalized(&self) -> Rational {
        self.active_set().map_or(Rational::UNDEFINED, |set| {
            set.as_base(&self.values)
                .multiply_int(set.divisor())
                .divide_int(set.multiplier())
                .unwrap_or(Rational::UNDEFINED)
        })
    }

    /// Total expressed in the base unit of set `index`.
    #[must_use]
    pub fn value_in(&self, index: usize) -> Rational {
        let Some(target) = K::family().set(index) else {
            return Rational::UNDEFINED;
        };
        self.normalized()
            .multiply_int(target.multiplier())
            .divide_int(target.divisor())
            .unwrap_or(Rational::UNDEFINED)
    }

    /// Convert to set `index`, either all in its base unit or simplified.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownSet`] for an invalid set index.
    pub fn to_set(&self, index: usize, simplify: bool) -> Result<Self> {
        let family = K::family();
        if family.set(index).is_none() {
            return Err(ValueError::UnknownSet {
                index,
                len: family.sets().len(),
            });
        }
        Ok(self.converted(index, simplify))
    }

    pub(super) fn converted(&self, index: usize, simplify: bool) -> Self {
        let Some(target) = K::family().set(index) else {
            return self.clone();
        };
        if !self.is_defined() || self.set == Some(index) {
            return self.clone();
        }
        Self {
            set: Some(index),
            values: target.convert(&self.normalized(), self.level, simplify),
            level: self.level,
            kind: PhantomData,
        }
    }

    /// Redistribute the total over the active set's units.
    #[must_use]
    pub fn simplify(&self) -> Self {
        let Some(set) = self.active_set() else {
            return self.clone();
        };
        Self {
            set: self.set,
            values: set.simplify(&set.as_base(&self.values), self.level),
            level: self.level,
            kind: PhantomData,
        }
    }

    fn combine(&self, other: &Self, subtract: bool) -> Self {
        if !self.is_defined() {
            return if subtract {
                other.map_slots(|value| value.negate())
            } else {
                other.clone()
            };
        }
        if !other.is_defined() {
            return self.clone();
        }
        let Some(index) = self.set else {
            return self.clone();
        };
        let other = other.converted(index, true);
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(mine, theirs)| match (mine, theirs) {
                (Some(a), Some(b)) if subtract => Some(a.subtract(b)),
                (Some(a), Some(b)) => Some(a.add(b)),
                (None, Some(b)) if subtract => Some(b.negate()),
                (None, Some(b)) => Some(*b),
                (value, None) => *value,
            })
            .collect();
        Self {
            set: self.set,
            values,
            level: self.level,
            kind: PhantomData,
        }
    }

    /// Slot-wise sum; the other value is converted into the active set first.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        self.combine(other, false)
    }

    /// Slot-wise difference; an empty slot minus `x` gives `-x`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        self.combine(other, true)
    }

    fn map_slots(&self, f: impl Fn(&Rational) -> Rational) -> Self {
        Self {
            set: self.set,
            values: self.values.iter().map(|slot| slot.as_ref().map(&f)).collect(),
            level: self.level,
            kind: PhantomData,
        }
    }

    #[must_use]
    pub fn multiply(&self, factor: &Rational) -> Self {
        self.map_slots(|value| value.multiply(factor)).simplify()
    }

    #[must_use]
    pub fn multiply_int(&self, factor: i64) -> Self {
        self.map_slots(|value| value.multiply_int(factor)).simplify()
    }

    /// # Errors
    ///
    /// Returns [`ValueError::DivisionByZero`] if `divisor` is zero.
    pub fn divide(&self, divisor: &Rational) -> Result<Self> {
        if divisor.is_null() {
            return Err(ValueError::DivisionByZero);
        }
        let inverse = Rational::ONE.divide(divisor)?;
        Ok(self.multiply(&inverse))
    }

    /// # Errors
    ///
    /// Returns [`ValueError::DivisionByZero`] if `divisor` is zero.
    pub fn divide_int(&self, divisor: i64) -> Result<Self> {
        self.divide(&Rational::from_int(divisor))
    }

    /// Order by total amount, independent of the active set.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.normalized().compare(&other.normalized())
    }

    /// Read repeated `RATIONAL UNIT` pairs; the first unit fixes the set.
    pub fn read(reader: &mut ParseReader<'_>) -> Option<Self> {
        let family = K::family();
        let mut set: Option<usize> = None;
        let mut values = Slots::new();

        loop {
            let start = reader.position();
            let Some(amount) = Rational::read(reader) else {
                break;
            };
            if amount.is_negative() {
                reader.seek(start);
                break;
            }

            let found = match set {
                Some(index) => family
                    .set(index)
                    .and_then(|unit_set| read_unit_name(unit_set, reader))
                    .map(|unit| (index, unit)),
                None => family
                    .sets()
                    .iter()
                    .enumerate()
                    .find_map(|(index, unit_set)| {
                        read_unit_name(unit_set, reader).map(|unit| (index, unit))
                    }),
            };
            let Some((index, unit)) = found else {
                reader.seek(start);
                break;
            };

            if set.is_none() {
                set = Some(index);
                values = smallvec![None; family.sets()[index].len()];
            }
            values[unit] = Some(values[unit].map_or(amount, |existing| existing.add(&amount)));
        }

        set.map(|set| Self {
            set: Some(set),
            values,
            level: K::SIMPLIFY_LEVEL,
            kind: PhantomData,
        })
    }

    /// Display with the shortest spelling of every unit, e.g. `"5 ft 2 in"`.
    #[must_use]
    pub fn to_short_string(&self) -> String {
        self.render(|unit, value| unit.format_short(value))
    }

    fn render(&self, format: impl Fn(&super::Unit, &Rational) -> String) -> String {
        let Some(set) = self.active_set() else {
            return UNDEFINED.to_string();
        };
        let parts: Vec<String> = set
            .units()
            .iter()
            .zip(self.values.iter())
            .filter_map(|(unit, value)| {
                value
                    .as_ref()
                    .filter(|value| !value.is_null())
                    .map(|value| format(unit, value))
            })
            .collect();
        if parts.is_empty() {
            return format!("0 {}", set.base_unit().plural());
        }
        parts.join(" ")
    }
}

fn read_unit_name(set: &UnitSet, reader: &mut ParseReader<'_>) -> Option<usize> {
    let name = reader.expect_any(set.units().iter().flat_map(super::Unit::names))?;
    set.find_unit(name)
}

impl<K: UnitKind> fmt::Display for Units<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|unit, value| unit.format(value)))
    }
}

impl<K: UnitKind> FromStr for Units<K> {
    type Err = ValueError;

    fn from_str(text: &str) -> Result<Self> {
        let mut reader = ParseReader::new(text);
        match Self::read(&mut reader) {
            Some(value) if reader.rest().trim().is_empty() => Ok(value),
            _ => Err(ValueError::Parse {
                kind: K::NAME,
                text: text.to_string(),
            }),
        }
    }
}
