//! Plain serde records for storing values outside the engine.
//!
//! Every value converts into a record with [`Record::to_record`] and back
//! with [`Record::from_record`], which re-runs the value's own validation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dice::Dice;
use crate::error::{Result, ValueError};
use crate::expression::{Expression, MagicItem};
use crate::modifier::{Modifier, ModifierType};
use crate::rational::Rational;
use crate::units::{UnitKind, Units};
use crate::value::{Value, ValueKind};

/// Conversion between a value and its external record.
pub trait Record: Sized {
    type Record: Serialize + DeserializeOwned;

    fn to_record(&self) -> Self::Record;

    /// # Errors
    ///
    /// Fails when the record describes an invalid value.
    fn from_record(record: &Self::Record) -> Result<Self>;
}

/// Serialize a value's record as JSON.
///
/// # Errors
///
/// Returns [`ValueError::Record`] if serialization fails.
pub fn to_json<T: Record>(value: &T) -> Result<String> {
    serde_json::to_string(&value.to_record()).map_err(|err| ValueError::Record(err.to_string()))
}

/// Read a value from its JSON record.
///
/// # Errors
///
/// Returns [`ValueError::Record`] for malformed JSON and the value's own
/// error for invalid contents.
pub fn from_json<T: Record>(json: &str) -> Result<T> {
    let record: T::Record =
        serde_json::from_str(json).map_err(|err| ValueError::Record(err.to_string()))?;
    T::from_record(&record)
}

/// `leader nominator/denominator`; all zero for an undefined value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationalRecord {
    #[serde(default)]
    pub leader: i64,
    #[serde(default)]
    pub nominator: i64,
    pub denominator: i64,
}

impl Record for Rational {
    type Record = RationalRecord;

    fn to_record(&self) -> RationalRecord {
        let (mut leader, mut nominator) = (self.leader(), self.nominator());
        if self.is_negative() {
            if leader == 0 {
                nominator = -nominator;
            } else {
                leader = -leader;
            }
        }
        RationalRecord {
            leader,
            nominator,
            denominator: self.denominator(),
        }
    }

    fn from_record(record: &RationalRecord) -> Result<Self> {
        if *record == Self::UNDEFINED.to_record() {
            return Ok(Self::UNDEFINED);
        }
        Self::new(record.leader, record.nominator, record.denominator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRecord {
    #[serde(default)]
    pub count: i64,
    pub sides: i64,
    #[serde(default)]
    pub modifier: i64,
}

impl Record for Dice {
    type Record = DiceRecord;

    fn to_record(&self) -> DiceRecord {
        DiceRecord {
            count: self.count(),
            sides: self.sides(),
            modifier: self.modifier(),
        }
    }

    fn from_record(record: &DiceRecord) -> Result<Self> {
        if *record == Self::UNDEFINED.to_record() {
            return Ok(Self::UNDEFINED);
        }
        Self::new(record.count, record.sides, record.modifier)
    }
}

/// Units by set name with one optional amount per unit, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitsRecord {
    pub set: Option<String>,
    #[serde(default)]
    pub values: Vec<Option<RationalRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
}

impl<K: UnitKind> Record for Units<K> {
    type Record = UnitsRecord;

    fn to_record(&self) -> UnitsRecord {
        UnitsRecord {
            set: self.active_set().map(|set| set.name().to_string()),
            values: self
                .values()
                .iter()
                .map(|slot| slot.as_ref().map(Record::to_record))
                .collect(),
            level: (self.level() != K::SIMPLIFY_LEVEL).then_some(self.level()),
        }
    }

    fn from_record(record: &UnitsRecord) -> Result<Self> {
        let Some(set) = &record.set else {
            return Ok(Self::undefined());
        };
        let values = record
            .values
            .iter()
            .map(|slot| slot.as_ref().map(Rational::from_record).transpose())
            .collect::<Result<Vec<_>>>()?;
        let units = Self::in_set(set, &values)?;
        Ok(match record.level {
            Some(level) => units.with_level(level),
            None => units,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierRecord {
    pub value: i64,
    #[serde(rename = "type", default = "default_modifier_type")]
    pub kind: ModifierType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<ModifierRecord>>,
}

const fn default_modifier_type() -> ModifierType {
    ModifierType::General
}

impl Record for Modifier {
    type Record = ModifierRecord;

    fn to_record(&self) -> ModifierRecord {
        ModifierRecord {
            value: self.own_value(),
            kind: self.kind(),
            condition: self.condition().map(str::to_string),
            next: self.next().map(|next| Box::new(next.to_record())),
        }
    }

    fn from_record(record: &ModifierRecord) -> Result<Self> {
        let mut modifier = Self::new(record.value, record.kind);
        if let Some(condition) = &record.condition {
            modifier = modifier.with_condition(condition);
        }
        if let Some(next) = &record.next {
            modifier = modifier.chain(Self::from_record(next)?);
        }
        Ok(modifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expression", rename_all = "snake_case")]
pub enum ExpressionRecord {
    MagicArmor {
        plus: i64,
    },
    MagicWeapon {
        plus: i64,
    },
    MagicItem {
        item: MagicItem,
        spell_level: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caster_level: Option<i64>,
        #[serde(default, skip_serializing_if = "is_zero")]
        material: i64,
        #[serde(default, skip_serializing_if = "is_zero")]
        xp: i64,
    },
    Factor {
        multiply: i64,
        #[serde(default = "default_divide")]
        divide: i64,
    },
    Equal {
        text: String,
    },
}

const fn default_divide() -> i64 {
    1
}

const fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Record for Expression {
    type Record = ExpressionRecord;

    fn to_record(&self) -> ExpressionRecord {
        match self {
            Self::MagicArmor { plus } => ExpressionRecord::MagicArmor { plus: *plus },
            Self::MagicWeapon { plus } => ExpressionRecord::MagicWeapon { plus: *plus },
            Self::MagicItem {
                item,
                spell_level,
                caster_level,
                material,
                xp,
            } => ExpressionRecord::MagicItem {
                item: *item,
                spell_level: *spell_level,
                caster_level: Some(*caster_level),
                material: *material,
                xp: *xp,
            },
            Self::Factor { multiply, divide } => ExpressionRecord::Factor {
                multiply: *multiply,
                divide: *divide,
            },
            Self::Equal { text } => ExpressionRecord::Equal { text: text.clone() },
        }
    }

    fn from_record(record: &ExpressionRecord) -> Result<Self> {
        match record {
            ExpressionRecord::MagicArmor { plus } => Ok(Self::MagicArmor { plus: *plus }),
            ExpressionRecord::MagicWeapon { plus } => Ok(Self::MagicWeapon { plus: *plus }),
            ExpressionRecord::MagicItem {
                item,
                spell_level,
                caster_level,
                material,
                xp,
            } => Self::magic_item(*item, *spell_level, *caster_level)?.with_costs(*material, *xp),
            ExpressionRecord::Factor { multiply, divide } => Self::factor(*multiply, *divide),
            ExpressionRecord::Equal { text } => Ok(Self::Equal { text: text.clone() }),
        }
    }
}

/// Any value as its kind and text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub kind: ValueKind,
    pub text: String,
}

impl Record for Value {
    type Record = ValueRecord;

    fn to_record(&self) -> ValueRecord {
        ValueRecord {
            kind: self.kind(),
            text: self.to_string(),
        }
    }

    fn from_record(record: &ValueRecord) -> Result<Self> {
        record.kind.parse(&record.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Distance, Money};

    fn rational(leader: i64, nominator: i64, denominator: i64) -> Rational {
        Rational::new(leader, nominator, denominator).unwrap()
    }

    #[test]
    fn rationals_keep_their_sign() {
        for value in [
            rational(1, 1, 2),
            rational(0, -1, 3),
            rational(-2, 1, 3),
            rational(5, 0, 1),
            Rational::ZERO,
            Rational::UNDEFINED,
        ] {
            assert_eq!(Rational::from_record(&value.to_record()), Ok(value), "{value}");
        }
        let record = RationalRecord {
            leader: 1,
            nominator: 1,
            denominator: 0,
        };
        assert_eq!(Rational::from_record(&record), Err(ValueError::ZeroDenominator));
    }

    #[test]
    fn dice_records_validate() {
        let json = to_json(&"2d6+1".parse::<Dice>().unwrap()).unwrap();
        assert_eq!(json, r#"{"count":2,"sides":6,"modifier":1}"#);
        assert_eq!(from_json::<Dice>(r#"{"sides":1,"modifier":4}"#), Ok(Dice::fixed(4)));
        assert!(from_json::<Dice>(r#"{"count":2,"sides":-6}"#).is_err());
        assert!(matches!(from_json::<Dice>("not json"), Err(ValueError::Record(_))));
    }

    #[test]
    fn units_record_by_set_name() {
        let distance: Distance = "2 mi 3 ft".parse().unwrap();
        let record = distance.to_record();
        assert_eq!(record.set.as_deref(), Some("Feet"));
        assert_eq!(record.values.len(), 3);
        assert_eq!(record.values[2], None);
        assert_eq!(Distance::from_record(&record), Ok(distance));

        let unknown = UnitsRecord {
            set: Some("Cubits".to_string()),
            values: Vec::new(),
            level: None,
        };
        assert!(matches!(
            Distance::from_record(&unknown),
            Err(ValueError::UnknownSet { .. })
        ));
        assert_eq!(
            Money::from_record(&Money::undefined().to_record()),
            Ok(Money::undefined())
        );
    }

    #[test]
    fn modifier_chains_survive() {
        let modifier: Modifier = "+2 dodge if \"moving\" +1 armor".parse().unwrap();
        let json = to_json(&modifier).unwrap();
        assert!(json.contains(r#""type":"dodge""#));
        assert_eq!(from_json::<Modifier>(&json), Ok(modifier));
        assert_eq!(
            from_json::<Modifier>(r#"{"value":3}"#),
            Ok(Modifier::general(3))
        );
    }

    #[test]
    fn expression_records_are_tagged() {
        let wand: Expression = "[wand(3)]".parse().unwrap();
        let json = to_json(&wand).unwrap();
        assert_eq!(
            json,
            r#"{"expression":"magic_item","item":"wand","spell_level":3,"caster_level":5}"#
        );
        assert_eq!(from_json::<Expression>(&json), Ok(wand));
        let scroll: Expression = "[scroll(1, 1, 100, 2)]".parse().unwrap();
        let json = to_json(&scroll).unwrap();
        assert!(json.ends_with(r#""material":100,"xp":2}"#), "{json}");
        assert_eq!(from_json::<Expression>(&json), Ok(scroll));
        assert!(matches!(
            from_json::<Expression>(r#"{"expression":"magic_item","item":"potion","spell_level":3,"caster_level":1}"#),
            Err(ValueError::InvalidCasterLevel { .. })
        ));
        assert_eq!(
            from_json::<Expression>(r#"{"expression":"factor","multiply":3}"#),
            Ok(Expression::Factor { multiply: 3, divide: 1 })
        );
    }

    #[test]
    fn values_store_kind_and_text() {
        let value = ValueKind::Money.parse("3 gp 5 sp").unwrap();
        let record = value.to_record();
        assert_eq!(record.text, "3 gp 5 sp");
        assert_eq!(Value::from_record(&record), Ok(value));
    }
}
