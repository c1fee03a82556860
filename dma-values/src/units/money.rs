//! Coins of the standard currency.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;

use super::{UnitFamily, UnitKind, Units, load_builtin};
use crate::error::{Result, ValueError};
use crate::rational::{Rational, UNDEFINED};

const DEFINITION: &str = "1/1 : D&D = \
     10/1 : pp : platinum|platinums|platinum piece|platinum pieces, \
     1/1 : gp : gold|golds|gold piece|gold pieces, \
     1/10 : sp : silver|silvers|silver piece|silver pieces, \
     1/100 : cp : copper|coppers|copper piece|copper pieces.";

static FAMILY: Lazy<UnitFamily> = Lazy::new(|| load_builtin("money", DEFINITION));

/// Upper bounds in copper pieces for [`Money::group`].
const GROUPS: [(i64, &str); 9] = [
    (1, "1 cp"),
    (10, "1 sp"),
    (100, "1 gp"),
    (1_000, "10 gp"),
    (10_000, "100 gp"),
    (100_000, "1000 gp"),
    (200_000, "2000 gp"),
    (400_000, "4000 gp"),
    (10_000_000, "100000 gp"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoneyKind;

impl UnitKind for MoneyKind {
    const NAME: &'static str = "money";
    const SIMPLIFY_LEVEL: i64 = 1;

    fn family() -> &'static UnitFamily {
        &FAMILY
    }
}

pub type Money = Units<MoneyKind>;

/// The four standard coins, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coin {
    Platinum,
    Gold,
    Silver,
    Copper,
}

impl Coin {
    pub const ALL: [Self; 4] = [Self::Platinum, Self::Gold, Self::Silver, Self::Copper];

    const fn slot(self) -> usize {
        match self {
            Self::Platinum => 0,
            Self::Gold => 1,
            Self::Silver => 2,
            Self::Copper => 3,
        }
    }

    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Platinum => "pp",
            Self::Gold => "gp",
            Self::Silver => "sp",
            Self::Copper => "cp",
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl Money {
    /// Money from a number of coins of every kind.
    #[must_use]
    pub fn standard(copper: i64, silver: i64, gold: i64, platinum: i64) -> Self {
        let slot = |value: i64| Some(Rational::from_int(value));
        Self::from_values(0, &[slot(platinum), slot(gold), slot(silver), slot(copper)])
            .unwrap_or_default()
    }

    #[must_use]
    pub fn coins(coin: Coin, amount: i64) -> Self {
        let mut values = [None; 4];
        values[coin.slot()] = Some(Rational::from_int(amount));
        Self::from_values(0, &values).unwrap_or_default()
    }

    #[must_use]
    pub fn gold(amount: i64) -> Self {
        Self::coins(Coin::Gold, amount)
    }

    #[must_use]
    pub fn amount(&self, coin: Coin) -> Rational {
        self.get(coin.slot()).unwrap_or(Rational::ZERO)
    }

    /// Total value in gold pieces.
    #[must_use]
    pub fn as_gold(&self) -> Rational {
        self.value_in(0)
    }

    /// Add (or, for negative amounts, take away) coins of one kind without
    /// changing the other coins.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InsufficientFunds`] if fewer coins of that kind
    /// are present than are taken away.
    pub fn add_coin(&self, coin: Coin, amount: i64) -> Result<Self> {
        let base = if self.is_defined() {
            self.to_set(0, false)?
        } else {
            Self::standard(0, 0, 0, 0)
        };
        let current = base.amount(coin);
        let updated = current.add_int(amount);
        if updated.is_negative() {
            return Err(ValueError::InsufficientFunds(format!(
                "cannot take {} {coin} from {current} {coin}",
                -amount
            )));
        }
        let mut values = base.values().to_vec();
        values[coin.slot()] = Some(updated);
        Ok(Self::from_values(0, &values)?.with_level(base.level()))
    }

    /// Coarse value label used to group similar prices.
    #[must_use]
    pub fn group(&self) -> &'static str {
        if !self.is_defined() {
            return UNDEFINED;
        }
        let copper = self.as_gold().multiply_int(100);
        GROUPS
            .iter()
            .find(|(bound, _)| copper.compare_int(*bound) != Ordering::Greater)
            .map_or("Infinite", |(_, label)| label)
    }
}
