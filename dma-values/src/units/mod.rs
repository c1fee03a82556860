//! Measurement units grouped into convertible sets.
//!
//! A family (say, distances) consists of sets such as "Feet" and "Metric".
//! Each set has one base unit and a factor relating its base unit to the
//! family's common scale, which is what makes conversion between sets possible.
//!
//! Families are declared with a small grammar:
//!
//! ```text
//! 1/1 : Feet = 5280/1 : mi : mile|miles, 1/1 : ft : foot|feet.
//! 2/5 : Metric = 1000/1 : km : kilometer|kilometers, 1/1 : m : meter|meters
//! ```
//!
//! Sets are separated by `.`, units by `,`. A unit is
//! `mult/div : name[|plural][|alias…] [: alias|…]`.

mod area;
mod distance;
mod duration;
mod money;
mod value;
mod volume;
mod weight;

use std::collections::HashSet;
use std::fmt;

use smallvec::{SmallVec, smallvec};

use crate::error::DefinitionError;
use crate::rational::Rational;

pub use area::{Area, AreaKind};
pub use distance::{Distance, DistanceKind};
pub use duration::{Duration, DurationKind};
pub use money::{Coin, Money, MoneyKind};
pub use value::{UnitKind, Units};
pub use volume::{Volume, VolumeKind};
pub use weight::{Weight, WeightKind};

/// One optional amount per unit of a set.
pub type Slots = SmallVec<[Option<Rational>; 4]>;

/// A single named unit with its ratio to the set's base unit.
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    plural: String,
    multiplier: i64,
    divisor: i64,
    aliases: Vec<String>,
}

impl Unit {
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidFactor`] unless both factors are positive.
    pub fn new(
        name: &str,
        plural: Option<&str>,
        multiplier: i64,
        divisor: i64,
        aliases: &[&str],
    ) -> Result<Self, DefinitionError> {
        if multiplier <= 0 || divisor <= 0 {
            return Err(DefinitionError::InvalidFactor(format!(
                "{multiplier}/{divisor}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            plural: plural.unwrap_or(name).to_string(),
            multiplier,
            divisor,
            aliases: aliases.iter().map(ToString::to_string).collect(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn plural(&self) -> &str {
        &self.plural
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub const fn multiplier(&self) -> i64 {
        self.multiplier
    }

    #[must_use]
    pub const fn divisor(&self) -> i64 {
        self.divisor
    }

    #[must_use]
    pub const fn is_base(&self) -> bool {
        self.multiplier == 1 && self.divisor == 1
    }

    /// Every spelling this unit can be read with.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(std::iter::once(self.plural.as_str()))
            .chain(self.aliases.iter().map(String::as_str))
    }

    /// Convert an amount of this unit into the set's base unit.
    #[must_use]
    pub fn as_base(&self, value: &Rational) -> Rational {
        value
            .multiply_int(self.multiplier)
            .divide_int(self.divisor)
            .unwrap_or(Rational::UNDEFINED)
    }

    /// Convert an amount of the set's base unit into this unit.
    #[must_use]
    pub fn from_base(&self, value: &Rational) -> Rational {
        value
            .multiply_int(self.divisor)
            .divide_int(self.multiplier)
            .unwrap_or(Rational::UNDEFINED)
    }

    /// `"0 ft"`, `"1 ft"`, `"1/2 ft"` or `"3 feet"`.
    #[must_use]
    pub fn format(&self, value: &Rational) -> String {
        if value.is_null() {
            return format!("0 {}", self.name);
        }
        if value.is_singular() {
            format!("{value} {}", self.name)
        } else {
            format!("{value} {}", self.plural)
        }
    }

    /// Like [`Self::format`] but always with the shortest spelling.
    #[must_use]
    pub fn format_short(&self, value: &Rational) -> String {
        let unit = self
            .names()
            .min_by_key(|name| name.len())
            .unwrap_or(self.name.as_str());
        format!("{value} {unit}")
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.multiplier == other.multiplier
            && self.divisor == other.divisor
    }
}

impl Eq for Unit {}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.plural)?;
        for alias in &self.aliases {
            write!(f, "/{alias}")?;
        }
        write!(f, " *{}/{}", self.multiplier, self.divisor)
    }
}

/// A named group of units sharing one base unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSet {
    name: String,
    multiplier: i64,
    divisor: i64,
    units: Vec<Unit>,
    base: usize,
}

impl UnitSet {
    /// # Errors
    ///
    /// Fails when the set is empty, has no or several base units, has
    /// non-positive factors, or repeats a name, plural or alias.
    pub fn new(
        name: &str,
        multiplier: i64,
        divisor: i64,
        units: Vec<Unit>,
    ) -> Result<Self, DefinitionError> {
        if multiplier <= 0 || divisor <= 0 {
            return Err(DefinitionError::InvalidFactor(format!(
                "{multiplier}/{divisor}"
            )));
        }
        if units.is_empty() {
            return Err(DefinitionError::EmptySet(name.to_string()));
        }

        let bases: Vec<usize> = units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.is_base())
            .map(|(index, _)| index)
            .collect();
        let &[base] = bases.as_slice() else {
            return Err(DefinitionError::BaseUnit {
                set: name.to_string(),
                found: bases.len(),
            });
        };

        check_unique_names(name, &units)?;

        Ok(Self {
            name: name.to_string(),
            multiplier,
            divisor,
            units,
            base,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn multiplier(&self) -> i64 {
        self.multiplier
    }

    #[must_use]
    pub const fn divisor(&self) -> i64 {
        self.divisor
    }

    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    #[must_use]
    pub const fn base_index(&self) -> usize {
        self.base
    }

    #[must_use]
    pub fn base_unit(&self) -> &Unit {
        &self.units[self.base]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Index of the unit spelled `name`.
    #[must_use]
    pub fn find_unit(&self, name: &str) -> Option<usize> {
        self.units
            .iter()
            .position(|unit| unit.names().any(|spelling| spelling == name))
    }

    /// Weighted sum of all given slots in the base unit.
    #[must_use]
    pub fn as_base(&self, values: &[Option<Rational>]) -> Rational {
        self.units
            .iter()
            .zip(values)
            .filter_map(|(unit, value)| value.as_ref().map(|v| unit.as_base(v)))
            .fold(Rational::ZERO, |total, value| total.add(&value))
    }

    /// Scale a family-normalized amount into this set and distribute it.
    #[must_use]
    pub fn convert(&self, normalized: &Rational, level: i64, simplify: bool) -> Slots {
        let total = normalized
            .multiply_int(self.multiplier)
            .divide_int(self.divisor)
            .unwrap_or(Rational::UNDEFINED);
        if simplify {
            return self.simplify(&total, level);
        }
        let mut result: Slots = smallvec![None; self.units.len()];
        result[self.base] = Some(total);
        result
    }

    /// Greedy decomposition of a base-unit amount, largest unit first.
    ///
    /// A unit keeps the whole remainder when its denominator is below the
    /// local threshold (`level`, or the step to the next smaller unit if
    /// that is finer), or when it is the last unit. Otherwise only the whole
    /// part stays and the fraction moves down.
    #[must_use]
    pub fn simplify(&self, total: &Rational, level: i64) -> Slots {
        let mut result: Slots = smallvec![None; self.units.len()];
        let mut rest = *total;
        for (index, unit) in self.units.iter().enumerate() {
            rest = unit.from_base(&rest);

            let threshold = match self.units.get(index + 1) {
                Some(next) if next.divisor > 1 => level.min(next.divisor / unit.divisor),
                _ => level,
            };
            if rest.denominator() < threshold || index + 1 == self.units.len() {
                log::trace!("{}: keeping {rest} {}", self.name, unit.name);
                result[index] = Some(rest);
                break;
            }
            if rest.leader() > 0 {
                let whole = Rational::from_int(rest.whole());
                result[index] = Some(whole);
                rest = rest.subtract(&whole);
            }
            rest = unit.as_base(&rest);
        }
        result
    }
}

impl fmt::Display for UnitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{}):", self.name, self.multiplier, self.divisor)?;
        for unit in &self.units {
            write!(f, " {unit};")?;
        }
        Ok(())
    }
}

/// All sets of one kind of measurement.
///
/// The default family has no sets; it reads and converts nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitFamily {
    sets: Vec<UnitSet>,
}

impl UnitFamily {
    /// # Errors
    ///
    /// Returns [`DefinitionError::NoSets`] for an empty list.
    pub fn new(sets: Vec<UnitSet>) -> Result<Self, DefinitionError> {
        if sets.is_empty() {
            return Err(DefinitionError::NoSets);
        }
        Ok(Self { sets })
    }

    /// Parse a declarative family definition.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] describing the first malformed part.
    pub fn parse(definition: &str) -> Result<Self, DefinitionError> {
        let sets = definition
            .split('.')
            .filter(|part| !part.trim().is_empty())
            .map(parse_set)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(sets)
    }

    #[must_use]
    pub fn sets(&self) -> &[UnitSet] {
        &self.sets
    }

    #[must_use]
    pub fn set(&self, index: usize) -> Option<&UnitSet> {
        self.sets.get(index)
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.sets
            .iter()
            .position(|set| set.name.eq_ignore_ascii_case(name))
    }
}

/// Parse one of the built-in definitions, logging and falling back to an
/// empty family if it is malformed.
fn load_builtin(kind: &str, definition: &str) -> UnitFamily {
    UnitFamily::parse(definition).unwrap_or_else(|err| {
        log::error!("built-in {kind} units are invalid: {err}");
        UnitFamily::default()
    })
}

fn check_unique_names(set: &str, units: &[Unit]) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for unit in units {
        let plural = (unit.plural != unit.name).then_some(unit.plural.as_str());
        let spellings = std::iter::once(unit.name.as_str())
            .chain(plural)
            .chain(unit.aliases.iter().map(String::as_str));
        for spelling in spellings {
            if !seen.insert(spelling) {
                return Err(DefinitionError::DuplicateName {
                    set: set.to_string(),
                    name: spelling.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn parse_factor(text: &str) -> Result<(i64, i64), DefinitionError> {
    let invalid = || DefinitionError::InvalidFactor(text.trim().to_string());
    let (multiplier, divisor) = text.split_once('/').ok_or_else(invalid)?;
    let multiplier = multiplier.trim().parse::<i64>().map_err(|_| invalid())?;
    let divisor = divisor.trim().parse::<i64>().map_err(|_| invalid())?;
    if multiplier <= 0 || divisor <= 0 {
        return Err(invalid());
    }
    Ok((multiplier, divisor))
}

fn parse_set(text: &str) -> Result<UnitSet, DefinitionError> {
    let (head, body) = text.split_once('=').ok_or_else(|| DefinitionError::Expected {
        expected: "=",
        context: text.trim().to_string(),
    })?;
    let (factor, name) = head.split_once(':').ok_or_else(|| DefinitionError::Expected {
        expected: ":",
        context: head.trim().to_string(),
    })?;
    let (multiplier, divisor) = parse_factor(factor)?;
    let units = body
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_unit)
        .collect::<Result<Vec<_>, _>>()?;
    UnitSet::new(name.trim(), multiplier, divisor, units)
}

fn parse_unit(text: &str) -> Result<Unit, DefinitionError> {
    let mut parts = text.split(':');
    let factor = parts.next().unwrap_or_default();
    let names = parts.next().ok_or_else(|| DefinitionError::Expected {
        expected: ":",
        context: text.trim().to_string(),
    })?;
    let (multiplier, divisor) = parse_factor(factor)?;

    let split = |list: &str| -> Vec<String> {
        list.split('|')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .collect()
    };
    let mut names = split(names).into_iter();
    let name = names.next().ok_or_else(|| DefinitionError::Expected {
        expected: "unit name",
        context: text.trim().to_string(),
    })?;
    let plural = names.next();
    let mut aliases: Vec<String> = names.collect();
    for extra in parts {
        aliases.extend(split(extra));
    }

    let alias_refs: Vec<&str> = aliases.iter().map(String::as_str).collect();
    Unit::new(&name, plural.as_deref(), multiplier, divisor, &alias_refs)
}
