//! Bracketed cost expressions such as `[magic armor(2)]` or `[* 2/3]`.
//!
//! Expressions collected for one aggregated value are sorted by priority and
//! then by their display form, and folded over the running total with one
//! [`Shared`] accumulator for the whole pass.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValueError};
use crate::numbers::narrow_i128;
use crate::rational::Rational;
use crate::reader::ParseReader;
use crate::units::{Coin, Money};
use crate::value::Aggregate;

static MAGIC_ARMOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^magic armor\((\d+)\)$").expect("valid armor pattern"));
static MAGIC_WEAPON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^magic weapon\((\d+)\)$").expect("valid weapon pattern"));
static MAGIC_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w+)\((\d+)(?:,\s*(\d+)(?:,\s*(\d+)(?:,\s*(\d+))?)?)?\)$")
        .expect("valid magic item pattern")
});
static FACTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\s*(\d+)(?:\s*/\s*(\d+))?$").expect("valid factor pattern")
});
static EQUAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^=\s*(.*)$").expect("valid equal pattern"));

/// Running totals of one expression pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shared {
    magic_armor: i64,
    magic_weapon: i64,
}

impl Shared {
    #[must_use]
    pub const fn magic_armor_total(&self) -> i64 {
        self.magic_armor
    }

    #[must_use]
    pub const fn magic_weapon_total(&self) -> i64 {
        self.magic_weapon
    }
}

/// Consumable magic items priced by spell and caster level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagicItem {
    Wand,
    Potion,
    Scroll,
}

impl MagicItem {
    pub const ALL: [Self; 3] = [Self::Wand, Self::Potion, Self::Scroll];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wand => "wand",
            Self::Potion => "potion",
            Self::Scroll => "scroll",
        }
    }

    /// Gold per spell level and caster level.
    #[must_use]
    pub const fn base_price(self) -> i64 {
        match self {
            Self::Wand => 15,
            Self::Potion => 50,
            Self::Scroll => 25,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.name() == name)
    }

    /// Lowest caster level able to create an item of `spell_level`.
    #[must_use]
    pub const fn minimum_caster_level(spell_level: i64) -> i64 {
        if spell_level > 1 { spell_level.saturating_mul(2) - 1 } else { 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    MagicArmor {
        plus: i64,
    },
    MagicWeapon {
        plus: i64,
    },
    /// A consumable priced by spell and caster level, plus material costs
    /// in gold and experience costs at 5 gp per point.
    MagicItem {
        item: MagicItem,
        spell_level: i64,
        caster_level: i64,
        material: i64,
        xp: i64,
    },
    Factor {
        multiply: i64,
        divide: i64,
    },
    Equal {
        text: String,
    },
}

impl Expression {
    /// A wand, potion or scroll; the caster level defaults to the minimum.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidCasterLevel`] if the caster level is below
    /// the minimum for the spell level.
    pub fn magic_item(
        item: MagicItem,
        spell_level: i64,
        caster_level: Option<i64>,
    ) -> Result<Self> {
        let minimum = MagicItem::minimum_caster_level(spell_level);
        let caster_level = caster_level.unwrap_or(minimum);
        if caster_level < minimum {
            return Err(ValueError::InvalidCasterLevel {
                spell_level,
                caster_level,
                minimum,
            });
        }
        Ok(Self::MagicItem {
            item,
            spell_level,
            caster_level,
            material: 0,
            xp: 0,
        })
    }

    /// Add material and experience costs to a magic item; other expressions
    /// are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotPositive`] for negative costs.
    pub fn with_costs(self, material: i64, xp: i64) -> Result<Self> {
        for (field, value) in [("material", material), ("xp", xp)] {
            if value < 0 {
                return Err(ValueError::NotPositive { field, value });
            }
        }
        Ok(match self {
            Self::MagicItem {
                item,
                spell_level,
                caster_level,
                ..
            } => Self::MagicItem {
                item,
                spell_level,
                caster_level,
                material,
                xp,
            },
            other => other,
        })
    }

    /// # Errors
    ///
    /// Returns [`ValueError::DivisionByZero`] for a zero divisor.
    pub fn factor(multiply: i64, divide: i64) -> Result<Self> {
        if divide == 0 {
            return Err(ValueError::DivisionByZero);
        }
        Ok(Self::Factor { multiply, divide })
    }

    /// Application order: lower priorities apply first.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::MagicArmor { .. } | Self::MagicWeapon { .. } | Self::MagicItem { .. } => 1,
            Self::Factor { .. } => 2,
            Self::Equal { .. } => 10,
        }
    }

    /// Parse the text between the brackets.
    ///
    /// # Errors
    ///
    /// Fails with [`ValueError::UnknownMagicItem`] or
    /// [`ValueError::InvalidCasterLevel`] for bad magic items and with
    /// [`ValueError::Parse`] if no form matches.
    pub fn parse_body(body: &str) -> Result<Self> {
        let body = body.replace('\n', "");
        let body = body.trim();
        if let Some(caps) = MAGIC_ARMOR.captures(body) {
            return Ok(Self::MagicArmor {
                plus: capture_int(&caps, 1, body)?,
            });
        }
        if let Some(caps) = MAGIC_WEAPON.captures(body) {
            return Ok(Self::MagicWeapon {
                plus: capture_int(&caps, 1, body)?,
            });
        }
        if let Some(caps) = FACTOR.captures(body) {
            let multiply = capture_int(&caps, 1, body)?;
            let divide = match caps.get(2) {
                Some(_) => capture_int(&caps, 2, body)?,
                None => 1,
            };
            return Self::factor(multiply, divide);
        }
        if let Some(caps) = MAGIC_ITEM.captures(body) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let item = MagicItem::from_name(name)
                .ok_or_else(|| ValueError::UnknownMagicItem(name.to_string()))?;
            let spell_level = capture_int(&caps, 2, body)?;
            let optional = |group: usize| match caps.get(group) {
                Some(_) => capture_int(&caps, group, body).map(Some),
                None => Ok(None),
            };
            let caster_level = optional(3)?;
            let material = optional(4)?.unwrap_or(0);
            let xp = optional(5)?.unwrap_or(0);
            return Self::magic_item(item, spell_level, caster_level)?.with_costs(material, xp);
        }
        if let Some(caps) = EQUAL.captures(body) {
            return Ok(Self::Equal {
                text: caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
            });
        }
        Err(parse_error(body))
    }

    /// Read `'[' BODY ']'`; a body that does not parse is logged and the
    /// reader restored.
    pub fn read(reader: &mut ParseReader<'_>) -> Option<Self> {
        let start = reader.position();
        if !reader.expect_char('[') {
            return None;
        }
        let rest = reader.rest();
        let Some(end) = rest.find(']') else {
            reader.seek(start);
            return None;
        };
        match Self::parse_body(&rest[..end]) {
            Ok(expression) => {
                reader.seek(reader.position() + end + 1);
                Some(expression)
            }
            Err(err) => {
                log::warn!("could not parse expression '[{}]': {err}", &rest[..end]);
                reader.seek(start);
                None
            }
        }
    }

    /// Apply this expression to the running value.
    ///
    /// Cost expressions add their price to currency values and replace an
    /// absent value by the price; other value kinds pass through unchanged.
    pub fn compute<T: Aggregate>(&self, value: Option<T>, shared: &mut Shared) -> Option<T> {
        match self {
            Self::MagicArmor { plus } => {
                let (existing, added) = (i128::from(shared.magic_armor), i128::from(*plus));
                let factor = (2 * existing)
                    .saturating_mul(added)
                    .saturating_add(added.saturating_mul(added));
                shared.magic_armor = shared.magic_armor.saturating_add(*plus);
                add_cost(value, Money::gold(narrow_i128(factor.saturating_mul(1000))))
            }
            Self::MagicWeapon { plus } => {
                let (existing, added) = (i128::from(shared.magic_weapon), i128::from(*plus));
                let factor = (4 * existing)
                    .saturating_mul(added)
                    .saturating_add(added.saturating_mul(added).saturating_mul(2));
                shared.magic_weapon = shared.magic_weapon.saturating_add(*plus);
                add_cost(value, Money::gold(narrow_i128(factor.saturating_mul(1000))))
            }
            Self::MagicItem {
                item,
                spell_level,
                caster_level,
                material,
                xp,
            } => {
                let price = item_cost(*item, *spell_level, *caster_level);
                let extra = i128::from(*material) + 5 * i128::from(*xp);
                let price = if extra > 0 {
                    price.add(&Money::gold(narrow_i128(extra)))
                } else {
                    price
                };
                add_cost(value, price)
            }
            Self::Factor { multiply, divide } => {
                let factor = Rational::fraction(*multiply, *divide).ok()?;
                value.map(|value| value.multiply(&factor))
            }
            Self::Equal { text } => value.map(|value| {
                value.reparse(text).unwrap_or_else(|| {
                    log::warn!("cannot read '{text}' as {}", value.kind_name());
                    value
                })
            }),
        }
    }

    /// Fold all `expressions` over `value` in application order.
    pub fn compute_all<T: Aggregate>(expressions: &[Self], value: Option<T>) -> Option<T> {
        let mut sorted: Vec<&Self> = expressions.iter().collect();
        sorted.sort();
        let mut shared = Shared::default();
        sorted
            .into_iter()
            .fold(value, |value, expression| expression.compute(value, &mut shared))
    }
}

fn capture_int(caps: &Captures<'_>, group: usize, body: &str) -> Result<i64> {
    caps.get(group)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| parse_error(body))
}

fn parse_error(body: &str) -> ValueError {
    ValueError::Parse {
        kind: "expression",
        text: body.to_string(),
    }
}

fn item_cost(item: MagicItem, spell_level: i64, caster_level: i64) -> Money {
    let price = i128::from(item.base_price()) * i128::from(caster_level);
    if spell_level > 0 {
        return Money::gold(narrow_i128(price.saturating_mul(i128::from(spell_level))));
    }
    if price % 2 == 0 {
        Money::gold(narrow_i128(price / 2))
    } else {
        Money::coins(Coin::Silver, narrow_i128(price * 5))
    }
}

fn add_cost<T: Aggregate>(value: Option<T>, cost: Money) -> Option<T> {
    let Some(value) = value else {
        return T::from_money(cost);
    };
    let total = value.as_money().map(|money| money.add(&cost));
    match total {
        Some(total) => T::from_money(total).or(Some(value)),
        None => Some(value),
    }
}

impl Ord for Expression {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority()
            .cmp(&other.priority())
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}

impl PartialOrd for Expression {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MagicArmor { plus } => write!(f, "[magic armor({plus})]"),
            Self::MagicWeapon { plus } => write!(f, "[magic weapon({plus})]"),
            Self::MagicItem {
                item,
                spell_level,
                caster_level,
                material,
                xp,
            } => {
                let name = item.name();
                if *xp != 0 {
                    write!(f, "[{name}({spell_level}, {caster_level}, {material}, {xp})]")
                } else if *material != 0 {
                    write!(f, "[{name}({spell_level}, {caster_level}, {material})]")
                } else if *caster_level == MagicItem::minimum_caster_level(*spell_level) {
                    write!(f, "[{name}({spell_level})]")
                } else {
                    write!(f, "[{name}({spell_level}, {caster_level})]")
                }
            }
            Self::Factor {
                multiply,
                divide: 1,
            } => write!(f, "[* {multiply}]"),
            Self::Factor { multiply, divide } => write!(f, "[* {multiply}/{divide}]"),
            Self::Equal { text } => write!(f, "[= {text}]"),
        }
    }
}

impl FromStr for Expression {
    type Err = ValueError;

    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .ok_or_else(|| parse_error(text))?;
        Self::parse_body(body)
    }
}
