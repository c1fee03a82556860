//! Exact signed fractions written as `leader nominator/denominator`.
//!
//! Magnitudes are stored non-negative with the sign kept separately, and every
//! value is kept in reduced form (`nominator < denominator`, coprime). A zero
//! denominator marks the undefined value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValueError};
use crate::numbers::{gcd, i64_to_f64, narrow_i128};
use crate::reader::ParseReader;

/// Text used for values that were never set.
pub const UNDEFINED: &str = "$undefined$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rational {
    leader: i64,
    nominator: i64,
    denominator: i64,
    negative: bool,
}

impl Rational {
    pub const UNDEFINED: Self = Self {
        leader: 0,
        nominator: 0,
        denominator: 0,
        negative: false,
    };

    pub const ZERO: Self = Self {
        leader: 0,
        nominator: 0,
        denominator: 1,
        negative: false,
    };

    pub const ONE: Self = Self {
        leader: 1,
        nominator: 0,
        denominator: 1,
        negative: false,
    };

    /// Create `leader nominator/denominator`, normalizing signs.
    ///
    /// A negative fraction with a non-negative leader reads as "leader minus
    /// fraction", so `new(1, -1, 2)` is `1/2`; a negative leader makes the whole
    /// value negative.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::ZeroDenominator`] if `denominator` is zero.
    pub fn new(leader: i64, nominator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(ValueError::ZeroDenominator);
        }
        Ok(Self::signed(leader, nominator, denominator))
    }

    /// Create the plain fraction `nominator/denominator`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::ZeroDenominator`] if `denominator` is zero.
    pub fn fraction(nominator: i64, denominator: i64) -> Result<Self> {
        Self::new(0, nominator, denominator)
    }

    #[must_use]
    pub fn from_int(value: i64) -> Self {
        Self::from_parts(i128::from(value), 1)
    }

    /// Sign handling for a (possibly mixed-sign) `leader nom/den`, with a
    /// non-zero denominator.
    fn signed(leader: i64, nominator: i64, denominator: i64) -> Self {
        let leader = i128::from(leader);
        let mut nominator = i128::from(nominator);
        let mut denominator = i128::from(denominator);
        let mut negative = false;
        if nominator < 0 {
            nominator = -nominator;
            negative = true;
        }
        if denominator < 0 {
            denominator = -denominator;
            negative = !negative;
        }

        let numerator = if negative {
            if leader < 0 {
                -(leader.abs() * denominator + nominator)
            } else {
                leader * denominator - nominator
            }
        } else if leader < 0 {
            -(leader.abs() * denominator + nominator)
        } else {
            leader * denominator + nominator
        };
        Self::from_parts(numerator, denominator)
    }

    /// Build the reduced value of `numerator / denominator` (denominator non-zero).
    fn from_parts(numerator: i128, denominator: i128) -> Self {
        if denominator == 0 {
            return Self::UNDEFINED;
        }
        let negative = (numerator < 0) != (denominator < 0) && numerator != 0;
        let mut magnitude = numerator.abs();
        let mut denominator = denominator.abs();
        let divisor = gcd(magnitude, denominator);
        if divisor > 1 {
            magnitude /= divisor;
            denominator /= divisor;
        }
        Self {
            leader: narrow_i128(magnitude / denominator),
            nominator: narrow_i128(magnitude % denominator),
            denominator: narrow_i128(denominator),
            negative,
        }
    }

    /// The signed improper numerator over [`Self::denominator`].
    fn numerator(&self) -> i128 {
        let magnitude =
            i128::from(self.leader) * i128::from(self.denominator) + i128::from(self.nominator);
        if self.negative { -magnitude } else { magnitude }
    }

    #[must_use]
    pub const fn leader(&self) -> i64 {
        self.leader
    }

    #[must_use]
    pub const fn nominator(&self) -> i64 {
        self.nominator
    }

    #[must_use]
    pub const fn denominator(&self) -> i64 {
        self.denominator
    }

    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.denominator != 0
    }

    /// Zero.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.is_defined() && self.leader == 0 && self.nominator == 0
    }

    #[must_use]
    pub const fn is_one(&self) -> bool {
        self.is_defined() && !self.negative && self.leader == 1 && self.nominator == 0
    }

    /// Whether a unit name should be singular: a pure fraction or exactly one.
    #[must_use]
    pub const fn is_singular(&self) -> bool {
        self.leader == 0 || (self.leader == 1 && self.nominator == 0)
    }

    #[must_use]
    pub const fn has_fraction(&self) -> bool {
        self.nominator != 0
    }

    /// Already reduced on construction; kept for call sites that want to be explicit.
    #[must_use]
    pub const fn reduce(&self) -> Self {
        *self
    }

    /// The signed whole part, truncated toward zero.
    #[must_use]
    pub const fn whole(&self) -> i64 {
        if self.negative { -self.leader } else { self.leader }
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        if !self.is_defined() {
            return *self;
        }
        Self::from_parts(-self.numerator(), i128::from(self.denominator))
    }

    /// Sum; an undefined operand yields the other one.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        if !self.is_defined() {
            return *other;
        }
        if !other.is_defined() {
            return *self;
        }
        let (a, b) = (i128::from(self.denominator), i128::from(other.denominator));
        Self::from_parts(self.numerator() * b + other.numerator() * a, a * b)
    }

    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    #[must_use]
    pub fn add_int(&self, value: i64) -> Self {
        self.add(&Self::from_int(value))
    }

    #[must_use]
    pub fn subtract_int(&self, value: i64) -> Self {
        self.add(&Self::from_int(-value))
    }

    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        if !self.is_defined() || !other.is_defined() {
            return Self::UNDEFINED;
        }
        Self::from_parts(
            self.numerator() * other.numerator(),
            i128::from(self.denominator) * i128::from(other.denominator),
        )
    }

    #[must_use]
    pub fn multiply_int(&self, factor: i64) -> Self {
        if !self.is_defined() {
            return *self;
        }
        Self::from_parts(
            self.numerator() * i128::from(factor),
            i128::from(self.denominator),
        )
    }

    /// # Errors
    ///
    /// Returns [`ValueError::DivisionByZero`] if `other` is zero.
    pub fn divide(&self, other: &Self) -> Result<Self> {
        if other.is_null() {
            return Err(ValueError::DivisionByZero);
        }
        if !self.is_defined() || !other.is_defined() {
            return Ok(Self::UNDEFINED);
        }
        Ok(Self::from_parts(
            self.numerator() * i128::from(other.denominator),
            i128::from(self.denominator) * other.numerator(),
        ))
    }

    /// # Errors
    ///
    /// Returns [`ValueError::DivisionByZero`] if `divisor` is zero.
    pub fn divide_int(&self, divisor: i64) -> Result<Self> {
        if divisor == 0 {
            return Err(ValueError::DivisionByZero);
        }
        if !self.is_defined() {
            return Ok(*self);
        }
        Ok(Self::from_parts(
            self.numerator(),
            i128::from(self.denominator) * i128::from(divisor),
        ))
    }

    /// Total order on the exact value; undefined sorts before everything else.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.is_defined(), other.is_defined()) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => (self.numerator() * i128::from(other.denominator))
                .cmp(&(other.numerator() * i128::from(self.denominator))),
        }
    }

    #[must_use]
    pub fn compare_int(&self, value: i64) -> Ordering {
        self.compare(&Self::from_int(value))
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        if !self.is_defined() {
            return 0.0;
        }
        let magnitude = i64_to_f64(self.leader)
            + i64_to_f64(self.nominator) / i64_to_f64(self.denominator);
        if self.negative { -magnitude } else { magnitude }
    }

    /// Markup form used by document renderers, e.g. `\frac[1]{1}{2}`.
    #[must_use]
    pub fn to_fraction_markup(&self) -> String {
        if !self.is_defined() {
            return UNDEFINED.to_string();
        }
        if !self.has_fraction() {
            return self.to_string();
        }
        let sign = if self.negative { "-" } else { "" };
        if self.leader == 0 {
            format!("{sign}\\frac{{{}}}{{{}}}", self.nominator, self.denominator)
        } else {
            format!(
                "{sign}\\frac[{}]{{{}}}{{{}}}",
                self.leader, self.nominator, self.denominator
            )
        }
    }

    /// Read `['-'] INT ['/' INT] | INT INT '/' INT` from the cursor.
    ///
    /// A fraction tail that does not complete (non-integer or zero denominator)
    /// is left unread and only the whole part is returned.
    pub fn read(reader: &mut ParseReader<'_>) -> Option<Self> {
        let first = reader.read_int()?;
        let after_first = reader.position();

        if reader.expect_char('/') {
            if let Some(denominator) = reader.read_int().filter(|d| *d != 0) {
                return Some(Self::signed(0, first, denominator));
            }
            reader.seek(after_first);
            return Some(Self::from_int(first));
        }

        reader.skip_whitespace();
        let mark = reader.position();
        if let Some(nominator) = reader.read_int()
            && reader.expect_char('/')
            && let Some(denominator) = reader.read_int().filter(|d| *d != 0)
        {
            return Some(Self::signed(first, nominator, denominator));
        }
        reader.seek(mark);
        Some(Self::from_int(first))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_defined() {
            return f.write_str(UNDEFINED);
        }
        if self.negative {
            f.write_str("-")?;
        }
        match (self.leader, self.nominator) {
            (0, 0) => f.write_str("0"),
            (leader, 0) => write!(f, "{leader}"),
            (0, nominator) => write!(f, "{nominator}/{}", self.denominator),
            (leader, nominator) => write!(f, "{leader} {nominator}/{}", self.denominator),
        }
    }
}

impl FromStr for Rational {
    type Err = ValueError;

    /// Parse the whole text as a rational; a zero denominator is an error.
    fn from_str(text: &str) -> Result<Self> {
        let mut reader = ParseReader::new(text);
        let parse_error = || ValueError::Parse {
            kind: "rational",
            text: text.to_string(),
        };
        let value = Self::read(&mut reader).ok_or_else(parse_error)?;
        let rest = reader.rest().trim();
        if rest.is_empty() {
            return Ok(value);
        }

        let mut tail = ParseReader::new(rest);
        let _ = tail.read_int();
        if tail.expect_char('/') && tail.read_int() == Some(0) && tail.rest().trim().is_empty() {
            return Err(ValueError::ZeroDenominator);
        }
        Err(parse_error())
    }
}
