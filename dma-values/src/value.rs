//! The arithmetic shared by every aggregatable value and the closed set of
//! concrete value kinds.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dice::Dice;
use crate::error::{Result, ValueError};
use crate::rational::Rational;
use crate::units::{Area, Distance, Duration, Money, UnitKind, Units, Volume, Weight};

/// Operations needed to sum and scale values of one kind.
pub trait Arithmetic: Sized + Clone + fmt::Debug + fmt::Display {
    /// Short lowercase name of the value's kind, e.g. `"dice"`.
    fn kind_name(&self) -> &'static str;

    fn can_add(&self, other: &Self) -> bool;

    /// # Errors
    ///
    /// Fails when the two values cannot be combined, e.g. dice with
    /// different sides or values of different kinds.
    fn add(&self, other: &Self) -> Result<Self>;

    /// Scale by a rational factor. Kinds that cannot represent the result
    /// return themselves unchanged.
    #[must_use]
    fn multiply(&self, factor: &Rational) -> Self;

    /// Ordering for min/max queries; `None` when the values are not
    /// comparable.
    fn compare(&self, other: &Self) -> Option<Ordering>;
}

/// What aggregation and cost expressions additionally need from a value.
pub trait Aggregate: Arithmetic {
    /// Wrap a currency amount, for value kinds that can hold one.
    fn from_money(money: Money) -> Option<Self> {
        let _ = money;
        None
    }

    fn as_money(&self) -> Option<&Money> {
        None
    }

    /// Undefined values are skipped when aggregating.
    fn is_defined(&self) -> bool {
        true
    }

    /// Read `text` as a value of the same kind as `self`.
    fn reparse(&self, text: &str) -> Option<Self>;

    /// Canonical form after arithmetic.
    #[must_use]
    fn simplified(&self) -> Self {
        self.clone()
    }

    /// The plain integer behind a number value; aggregation turns trailing
    /// numbers into modifiers.
    fn as_number(&self) -> Option<i64> {
        None
    }
}

impl Arithmetic for i64 {
    fn kind_name(&self) -> &'static str {
        "number"
    }

    fn can_add(&self, _other: &Self) -> bool {
        true
    }

    fn add(&self, other: &Self) -> Result<Self> {
        Ok(self.saturating_add(*other))
    }

    fn multiply(&self, factor: &Rational) -> Self {
        Rational::from_int(*self).multiply(factor).whole()
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Aggregate for i64 {
    fn reparse(&self, text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn as_number(&self) -> Option<i64> {
        Some(*self)
    }
}

impl Arithmetic for Rational {
    fn kind_name(&self) -> &'static str {
        "rational"
    }

    fn can_add(&self, _other: &Self) -> bool {
        true
    }

    fn add(&self, other: &Self) -> Result<Self> {
        Ok(Self::add(self, other))
    }

    fn multiply(&self, factor: &Rational) -> Self {
        Self::multiply(self, factor)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(Self::compare(self, other))
    }
}

impl Aggregate for Rational {
    fn is_defined(&self) -> bool {
        Rational::is_defined(self)
    }

    fn reparse(&self, text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl Arithmetic for Dice {
    fn kind_name(&self) -> &'static str {
        "dice"
    }

    fn can_add(&self, other: &Self) -> bool {
        self.count() == 0 || other.count() == 0 || self.sides() == other.sides()
    }

    fn add(&self, other: &Self) -> Result<Self> {
        Self::add(self, other)
    }

    /// Only whole, non-negative factors can scale dice.
    fn multiply(&self, factor: &Rational) -> Self {
        if factor.has_fraction() || factor.is_negative() {
            log::debug!("cannot scale {self} by {factor}");
            return *self;
        }
        Self::multiply(self, factor.whole())
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(
            self.average()
                .cmp(&other.average())
                .then_with(|| self.max().cmp(&other.max())),
        )
    }
}

impl Aggregate for Dice {
    fn is_defined(&self) -> bool {
        Dice::is_defined(self)
    }

    fn reparse(&self, text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl<K: UnitKind> Arithmetic for Units<K> {
    fn kind_name(&self) -> &'static str {
        K::NAME
    }

    fn can_add(&self, _other: &Self) -> bool {
        true
    }

    fn add(&self, other: &Self) -> Result<Self> {
        Ok(Self::add(self, other))
    }

    fn multiply(&self, factor: &Rational) -> Self {
        Self::multiply(self, factor)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(Self::compare(self, other))
    }
}

impl<K: UnitKind> Aggregate for Units<K> {
    fn from_money(money: Money) -> Option<Self> {
        let boxed: Box<dyn Any> = Box::new(money);
        boxed.downcast::<Self>().ok().map(|units| *units)
    }

    fn as_money(&self) -> Option<&Money> {
        (self as &dyn Any).downcast_ref::<Money>()
    }

    fn is_defined(&self) -> bool {
        Units::is_defined(self)
    }

    fn reparse(&self, text: &str) -> Option<Self> {
        text.parse().ok()
    }

    fn simplified(&self) -> Self {
        self.simplify()
    }
}

/// The kinds a [`Value`] can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Number,
    Rational,
    Dice,
    Distance,
    Area,
    Duration,
    Volume,
    Weight,
    Money,
}

impl ValueKind {
    pub const ALL: [Self; 9] = [
        Self::Number,
        Self::Rational,
        Self::Dice,
        Self::Distance,
        Self::Area,
        Self::Duration,
        Self::Volume,
        Self::Weight,
        Self::Money,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Rational => "rational",
            Self::Dice => "dice",
            Self::Distance => "distance",
            Self::Area => "area",
            Self::Duration => "duration",
            Self::Volume => "volume",
            Self::Weight => "weight",
            Self::Money => "money",
        }
    }

    /// Parse the whole of `text` as a value of this kind.
    ///
    /// # Errors
    ///
    /// Returns the parse error of the underlying type.
    pub fn parse(self, text: &str) -> Result<Value> {
        Ok(match self {
            Self::Number => Value::Number(text.trim().parse().map_err(|_| ValueError::Parse {
                kind: "number",
                text: text.to_string(),
            })?),
            Self::Rational => Value::Rational(text.parse()?),
            Self::Dice => Value::Dice(text.parse()?),
            Self::Distance => Value::Distance(text.parse()?),
            Self::Area => Value::Area(text.parse()?),
            Self::Duration => Value::Duration(text.parse()?),
            Self::Volume => Value::Volume(text.parse()?),
            Self::Weight => Value::Weight(text.parse()?),
            Self::Money => Value::Money(text.parse()?),
        })
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any of the concrete value kinds, so entries of different kinds can be
/// aggregated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(i64),
    Rational(Rational),
    Dice(Dice),
    Distance(Distance),
    Area(Area),
    Duration(Duration),
    Volume(Volume),
    Weight(Weight),
    Money(Money),
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Value::Number($inner) => $body,
            Value::Rational($inner) => $body,
            Value::Dice($inner) => $body,
            Value::Distance($inner) => $body,
            Value::Area($inner) => $body,
            Value::Duration($inner) => $body,
            Value::Volume($inner) => $body,
            Value::Weight($inner) => $body,
            Value::Money($inner) => $body,
        }
    };
}

macro_rules! pairwise {
    ($left:expr, $right:expr, $a:ident, $b:ident => $same:expr, _ => $other:expr) => {
        match ($left, $right) {
            (Value::Number($a), Value::Number($b)) => $same,
            (Value::Rational($a), Value::Rational($b)) => $same,
            (Value::Dice($a), Value::Dice($b)) => $same,
            (Value::Distance($a), Value::Distance($b)) => $same,
            (Value::Area($a), Value::Area($b)) => $same,
            (Value::Duration($a), Value::Duration($b)) => $same,
            (Value::Volume($a), Value::Volume($b)) => $same,
            (Value::Weight($a), Value::Weight($b)) => $same,
            (Value::Money($a), Value::Money($b)) => $same,
            _ => $other,
        }
    };
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Rational(_) => ValueKind::Rational,
            Self::Dice(_) => ValueKind::Dice,
            Self::Distance(_) => ValueKind::Distance,
            Self::Area(_) => ValueKind::Area,
            Self::Duration(_) => ValueKind::Duration,
            Self::Volume(_) => ValueKind::Volume,
            Self::Weight(_) => ValueKind::Weight,
            Self::Money(_) => ValueKind::Money,
        }
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Rational(value) => value.is_defined(),
            Self::Dice(value) => value.is_defined(),
            Self::Distance(value) => value.is_defined(),
            Self::Area(value) => value.is_defined(),
            Self::Duration(value) => value.is_defined(),
            Self::Volume(value) => value.is_defined(),
            Self::Weight(value) => value.is_defined(),
            Self::Money(value) => value.is_defined(),
        }
    }
}

impl Arithmetic for Value {
    fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    fn can_add(&self, other: &Self) -> bool {
        pairwise!(self, other, a, b => Arithmetic::can_add(a, b), _ => false)
    }

    fn add(&self, other: &Self) -> Result<Self> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(Arithmetic::add(a, b)?)),
            (Self::Rational(a), Self::Rational(b)) => Ok(Self::Rational(a.add(b))),
            (Self::Dice(a), Self::Dice(b)) => Ok(Self::Dice(a.add(b)?)),
            (Self::Distance(a), Self::Distance(b)) => Ok(Self::Distance(a.add(b))),
            (Self::Area(a), Self::Area(b)) => Ok(Self::Area(a.add(b))),
            (Self::Duration(a), Self::Duration(b)) => Ok(Self::Duration(a.add(b))),
            (Self::Volume(a), Self::Volume(b)) => Ok(Self::Volume(a.add(b))),
            (Self::Weight(a), Self::Weight(b)) => Ok(Self::Weight(a.add(b))),
            (Self::Money(a), Self::Money(b)) => Ok(Self::Money(a.add(b))),
            _ => Err(ValueError::IncompatibleKinds {
                left: self.kind_name(),
                right: other.kind_name(),
            }),
        }
    }

    fn multiply(&self, factor: &Rational) -> Self {
        match self {
            Self::Number(value) => Self::Number(Arithmetic::multiply(value, factor)),
            Self::Rational(value) => Self::Rational(value.multiply(factor)),
            Self::Dice(value) => Self::Dice(Arithmetic::multiply(value, factor)),
            Self::Distance(value) => Self::Distance(value.multiply(factor)),
            Self::Area(value) => Self::Area(value.multiply(factor)),
            Self::Duration(value) => Self::Duration(value.multiply(factor)),
            Self::Volume(value) => Self::Volume(value.multiply(factor)),
            Self::Weight(value) => Self::Weight(value.multiply(factor)),
            Self::Money(value) => Self::Money(value.multiply(factor)),
        }
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        pairwise!(self, other, a, b => Arithmetic::compare(a, b), _ => None)
    }
}

impl Aggregate for Value {
    fn from_money(money: Money) -> Option<Self> {
        Some(Self::Money(money))
    }

    fn as_money(&self) -> Option<&Money> {
        match self {
            Self::Money(money) => Some(money),
            _ => None,
        }
    }

    fn is_defined(&self) -> bool {
        Value::is_defined(self)
    }

    fn reparse(&self, text: &str) -> Option<Self> {
        self.kind().parse(text).ok()
    }

    fn simplified(&self) -> Self {
        match self {
            Self::Distance(value) => Self::Distance(value.simplify()),
            Self::Area(value) => Self::Area(value.simplify()),
            Self::Duration(value) => Self::Duration(value.simplify()),
            Self::Volume(value) => Self::Volume(value.simplify()),
            Self::Weight(value) => Self::Weight(value.simplify()),
            Self::Money(value) => Self::Money(value.simplify()),
            other => other.clone(),
        }
    }

    fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, value => fmt::Display::fmt(value, f))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<Rational> for Value {
    fn from(value: Rational) -> Self {
        Self::Rational(value)
    }
}

impl From<Dice> for Value {
    fn from(value: Dice) -> Self {
        Self::Dice(value)
    }
}

impl From<Distance> for Value {
    fn from(value: Distance) -> Self {
        Self::Distance(value)
    }
}

impl From<Money> for Value {
    fn from(value: Money) -> Self {
        Self::Money(value)
    }
}
