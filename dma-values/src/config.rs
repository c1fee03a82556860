//! Engine configuration: comment limits, simplification levels and the dice
//! seed.

use serde::{Deserialize, Serialize};

use crate::comment::{Comment, DEFAULT_STARTER};
use crate::error::ConfigError;
use crate::seed::DiceBag;
use crate::units::{
    AreaKind, DistanceKind, DurationKind, MoneyKind, UnitKind, Units, VolumeKind, WeightKind,
};
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub comment: CommentConfig,
    #[serde(default)]
    pub simplify: SimplifyLevels,
    /// Fixed seed for dice rolls; entropy is used when absent.
    #[serde(default)]
    pub dice_seed: Option<u64>,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and the validation
    /// error for out-of-range fields.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates its bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.comment.validate()?;
        self.simplify.validate()
    }

    /// Seeded dice when a seed is configured, entropy otherwise.
    #[must_use]
    pub fn dice_bag(&self) -> DiceBag {
        self.dice_seed.map_or_else(DiceBag::from_entropy, DiceBag::from_seed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentConfig {
    /// Blocks separated by blank lines; unlimited when absent.
    #[serde(default)]
    pub max_comments: Option<usize>,
    #[serde(default)]
    pub max_lines: Option<usize>,
    #[serde(default = "CommentConfig::default_starter")]
    pub starter: String,
}

impl CommentConfig {
    fn default_starter() -> String {
        DEFAULT_STARTER.to_string()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.starter.trim().is_empty() {
            return Err(ConfigError::EmptyCommentStarter);
        }
        for (field, limit) in [
            ("comment.max_comments", self.max_comments),
            ("comment.max_lines", self.max_lines),
        ] {
            if limit == Some(0) {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1,
                    value: 0,
                });
            }
        }
        Ok(())
    }

    /// An empty comment reading with these limits.
    #[must_use]
    pub fn template(&self) -> Comment {
        Comment::new(self.max_comments, self.max_lines).with_starter(&self.starter)
    }
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_comments: None,
            max_lines: None,
            starter: Self::default_starter(),
        }
    }
}

/// Denominator thresholds used when simplifying each kind of units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifyLevels {
    #[serde(default = "SimplifyLevels::default_distance")]
    pub distance: i64,
    #[serde(default = "SimplifyLevels::default_area")]
    pub area: i64,
    #[serde(default = "SimplifyLevels::default_duration")]
    pub duration: i64,
    #[serde(default = "SimplifyLevels::default_volume")]
    pub volume: i64,
    #[serde(default = "SimplifyLevels::default_weight")]
    pub weight: i64,
    #[serde(default = "SimplifyLevels::default_money")]
    pub money: i64,
}

impl SimplifyLevels {
    const fn default_distance() -> i64 {
        DistanceKind::SIMPLIFY_LEVEL
    }

    const fn default_area() -> i64 {
        AreaKind::SIMPLIFY_LEVEL
    }

    const fn default_duration() -> i64 {
        DurationKind::SIMPLIFY_LEVEL
    }

    const fn default_volume() -> i64 {
        VolumeKind::SIMPLIFY_LEVEL
    }

    const fn default_weight() -> i64 {
        WeightKind::SIMPLIFY_LEVEL
    }

    const fn default_money() -> i64 {
        MoneyKind::SIMPLIFY_LEVEL
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("simplify.distance", self.distance),
            ("simplify.area", self.area),
            ("simplify.duration", self.duration),
            ("simplify.volume", self.volume),
            ("simplify.weight", self.weight),
            ("simplify.money", self.money),
        ] {
            if value < 1 {
                return Err(ConfigError::MinViolation { field, min: 1, value });
            }
        }
        Ok(())
    }

    /// The level for a kind of value; `None` for kinds without units.
    #[must_use]
    pub const fn level(&self, kind: ValueKind) -> Option<i64> {
        match kind {
            ValueKind::Distance => Some(self.distance),
            ValueKind::Area => Some(self.area),
            ValueKind::Duration => Some(self.duration),
            ValueKind::Volume => Some(self.volume),
            ValueKind::Weight => Some(self.weight),
            ValueKind::Money => Some(self.money),
            ValueKind::Number | ValueKind::Rational | ValueKind::Dice => None,
        }
    }

    /// `value` with its configured simplification level.
    #[must_use]
    pub fn apply(&self, value: Value) -> Value {
        let Some(level) = self.level(value.kind()) else {
            return value;
        };
        match value {
            Value::Distance(units) => Value::Distance(with_level(units, level)),
            Value::Area(units) => Value::Area(with_level(units, level)),
            Value::Duration(units) => Value::Duration(with_level(units, level)),
            Value::Volume(units) => Value::Volume(with_level(units, level)),
            Value::Weight(units) => Value::Weight(with_level(units, level)),
            Value::Money(units) => Value::Money(with_level(units, level)),
            other => other,
        }
    }
}

fn with_level<K: UnitKind>(units: Units<K>, level: i64) -> Units<K> {
    units.with_level(level)
}

impl Default for SimplifyLevels {
    fn default() -> Self {
        Self {
            distance: Self::default_distance(),
            area: Self::default_area(),
            duration: Self::default_duration(),
            volume: Self::default_volume(),
            weight: Self::default_weight(),
            money: Self::default_money(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ParseReader;

    #[test]
    fn defaults_match_unit_kinds() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.simplify.distance, 3);
        assert_eq!(config.simplify.money, 1);
        assert_eq!(config.comment.starter, "#");
        assert_eq!(config.dice_seed, None);
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = EngineConfig::from_json(
            r#"{"simplify": {"weight": 16}, "comment": {"max_lines": 2, "starter": "//"}, "dice_seed": 7}"#,
        )
        .unwrap();
        assert_eq!(config.simplify.weight, 16);
        assert_eq!(config.simplify.volume, 5);
        assert_eq!(config.dice_seed, Some(7));

        let comment = config.comment.template();
        let read = comment.read(&mut ParseReader::new("// a\n// b\n// c")).unwrap();
        assert_eq!(read.text(), Some("// a\n// b\n"));
    }

    #[test]
    fn validation_rejects_bad_fields() {
        assert_eq!(
            EngineConfig::from_json(r#"{"simplify": {"area": 0}}"#),
            Err(ConfigError::MinViolation {
                field: "simplify.area",
                min: 1,
                value: 0
            })
        );
        assert_eq!(
            EngineConfig::from_json(r#"{"comment": {"starter": " "}}"#),
            Err(ConfigError::EmptyCommentStarter)
        );
        assert!(matches!(
            EngineConfig::from_json(r#"{"comment": {"max_comments": 0}}"#),
            Err(ConfigError::MinViolation { .. })
        ));
        assert!(matches!(EngineConfig::from_json("[1"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn levels_apply_to_unit_values() {
        let levels = SimplifyLevels {
            weight: 16,
            ..SimplifyLevels::default()
        };
        let value = levels.apply(ValueKind::Weight.parse("1 lb").unwrap());
        let Value::Weight(weight) = value else {
            panic!("expected a weight");
        };
        assert_eq!(weight.level(), 16);
        assert_eq!(levels.level(ValueKind::Dice), None);
        assert_eq!(levels.apply(Value::Number(3)), Value::Number(3));
    }

    #[test]
    fn seeded_dice_repeat() {
        let config = EngineConfig {
            dice_seed: Some(42),
            ..EngineConfig::default()
        };
        let dice = "3d6".parse().unwrap();
        let first = config.dice_bag().roll_many(&dice, 5);
        let second = config.dice_bag().roll_many(&dice, 5);
        assert_eq!(first, second);
    }
}
