//! Typed bonuses such as `+2 dodge` and the numbers they modify.
//!
//! Modifiers of the same type and condition combine according to the type's
//! stacking rule; modifiers of different types are chained.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValueError};
use crate::reader::ParseReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierType {
    Dodge,
    Armor,
    Equipment,
    Shield,
    General,
    NaturalArmor,
    Ability,
    Size,
    Racial,
    Circumstance,
    Enhancement,
    Deflection,
    Competence,
}

impl ModifierType {
    pub const ALL: [Self; 13] = [
        Self::Dodge,
        Self::Armor,
        Self::Equipment,
        Self::Shield,
        Self::General,
        Self::NaturalArmor,
        Self::Ability,
        Self::Size,
        Self::Racial,
        Self::Circumstance,
        Self::Enhancement,
        Self::Deflection,
        Self::Competence,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dodge => "dodge",
            Self::Armor => "armor",
            Self::Equipment => "equipment",
            Self::Shield => "shield",
            Self::General => "general",
            Self::NaturalArmor => "natural armor",
            Self::Ability => "ability",
            Self::Size => "size",
            Self::Racial => "racial",
            Self::Circumstance => "circumstance",
            Self::Enhancement => "enhancement",
            Self::Deflection => "deflection",
            Self::Competence => "competence",
        }
    }

    /// Whether several bonuses of this type add up instead of only the
    /// largest one counting.
    #[must_use]
    pub const fn stacks(self) -> bool {
        matches!(
            self,
            Self::Dodge | Self::General | Self::Ability | Self::Circumstance
        )
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ModifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chain of typed bonuses, each optionally guarded by a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Modifier {
    value: i64,
    kind: ModifierType,
    condition: Option<String>,
    next: Option<Box<Modifier>>,
}

impl Modifier {
    #[must_use]
    pub const fn new(value: i64, kind: ModifierType) -> Self {
        Self {
            value,
            kind,
            condition: None,
            next: None,
        }
    }

    #[must_use]
    pub const fn general(value: i64) -> Self {
        Self::new(value, ModifierType::General)
    }

    /// Guard this link by `condition`; an existing condition is extended.
    #[must_use]
    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => format!("{existing} and {condition}"),
            None => condition.to_string(),
        });
        self
    }

    /// Append `next` at the end of the chain.
    #[must_use]
    pub fn chain(mut self, next: Self) -> Self {
        self.next = Some(Box::new(match self.next.take() {
            Some(existing) => existing.chain(next),
            None => next,
        }));
        self
    }

    /// Value of this link only.
    #[must_use]
    pub const fn own_value(&self) -> i64 {
        self.value
    }

    /// Sum over the whole chain.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.links().map(|link| link.value).sum()
    }

    /// Smallest possible total when conditional bonuses may or may not apply.
    #[must_use]
    pub fn min_value(&self) -> i64 {
        self.links()
            .map(|link| match link.condition {
                None => link.value,
                Some(_) => link.value.min(0),
            })
            .sum()
    }

    /// Largest possible total when conditional bonuses may or may not apply.
    #[must_use]
    pub fn max_value(&self) -> i64 {
        self.links()
            .map(|link| match link.condition {
                None => link.value,
                Some(_) => link.value.max(0),
            })
            .sum()
    }

    #[must_use]
    pub const fn kind(&self) -> ModifierType {
        self.kind
    }

    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    #[must_use]
    pub fn next(&self) -> Option<&Self> {
        self.next.as_deref()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value() == 0
    }

    fn links(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |link| link.next())
    }

    /// Penalties and conditional bonuses always stack.
    #[must_use]
    pub fn stacks(&self) -> bool {
        self.value < 0 || self.condition.is_some() || self.kind.stacks()
    }

    /// Whether this bonus still counts next to `other`: either stacks, or
    /// this one is strictly larger.
    #[must_use]
    pub fn stack_or_more(&self, other: &Self) -> bool {
        self.stacks() || other.stacks() || self.value > other.value
    }

    /// Whether this bonus counts next to all of `others`.
    #[must_use]
    pub fn stack_or_more_all(&self, others: &[Self]) -> bool {
        self.value < 0 || others.iter().all(|other| self.stack_or_more(other))
    }

    /// Combine two chains.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        if self.kind == other.kind && self.condition == other.condition {
            let next = match (&self.next, &other.next) {
                (None, next) | (next, None) => next.clone(),
                (Some(mine), Some(theirs)) => Some(Box::new(mine.add(theirs))),
            };
            let value = if self.kind.stacks() {
                self.value + other.value
            } else {
                self.value.max(other.value)
            };
            return Self {
                value,
                kind: self.kind,
                condition: self.condition.clone(),
                next,
            };
        }

        let next = match &self.next {
            Some(next) => next.add(other),
            None => other.clone(),
        };
        Self {
            value: self.value,
            kind: self.kind,
            condition: self.condition.clone(),
            next: Some(Box::new(next)),
        }
    }

    /// Drop the non-negative links of the given types.
    #[must_use]
    pub fn ignore(&self, kinds: &[ModifierType]) -> Option<Self> {
        let next = self.next().and_then(|next| next.ignore(kinds));
        if self.value >= 0 && kinds.contains(&self.kind) {
            return next;
        }
        Some(Self {
            value: self.value,
            kind: self.kind,
            condition: self.condition.clone(),
            next: next.map(Box::new),
        })
    }

    /// Every link as `"+2 dodge"`, without conditions.
    #[must_use]
    pub fn bases(&self) -> Vec<String> {
        self.links()
            .map(|link| format!("{:+} {}", link.value, link.kind))
            .collect()
    }

    /// Read `SIGNED_INT [TYPE] ['if' "CONDITION"] [MODIFIER]`.
    pub fn read(reader: &mut ParseReader<'_>) -> Option<Self> {
        let value = reader.read_int()?;
        let kind = reader
            .expect_any(ModifierType::ALL.iter().map(|kind| kind.name()))
            .and_then(ModifierType::from_name)
            .unwrap_or(ModifierType::General);
        let condition = read_condition(reader);
        let next = Self::read(reader).map(Box::new);
        Some(Self {
            value,
            kind,
            condition,
            next,
        })
    }
}

fn read_condition(reader: &mut ParseReader<'_>) -> Option<String> {
    let start = reader.position();
    if !reader.expect_word("if") {
        return None;
    }
    if reader.expect_char('"') {
        let rest = reader.rest();
        if let Some(end) = rest.find('"') {
            reader.seek(reader.position() + end + 1);
            return Some(rest[..end].to_string());
        }
    }
    log::debug!("expected a quoted condition after 'if' at offset {start}");
    reader.seek(start);
    None
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+} {}", self.value, self.kind)?;
        if let Some(condition) = &self.condition {
            write!(f, " if \"{condition}\"")?;
        }
        if let Some(next) = &self.next {
            write!(f, " {next}")?;
        }
        Ok(())
    }
}

impl FromStr for Modifier {
    type Err = ValueError;

    fn from_str(text: &str) -> Result<Self> {
        let mut reader = ParseReader::new(text);
        match Self::read(&mut reader) {
            Some(modifier) if reader.rest().trim().is_empty() => Ok(modifier),
            _ => Err(ValueError::Parse {
                kind: "modifier",
                text: text.to_string(),
            }),
        }
    }
}

/// A plain number together with the named modifiers applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModifiedNumber {
    base: i64,
    modifiers: BTreeMap<String, Modifier>,
    total: Option<Modifier>,
}

impl ModifiedNumber {
    #[must_use]
    pub fn new(base: i64) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`ValueError::DuplicateModifier`] if `name` was already added.
    pub fn with_modifier(mut self, modifier: Modifier, name: &str) -> Result<Self> {
        if self.modifiers.contains_key(name) {
            return Err(ValueError::DuplicateModifier(name.to_string()));
        }
        Ok(self.with_merged_modifier(modifier, name))
    }

    /// Like [`Self::with_modifier`], but a repeated `name` adds to the
    /// modifier already stored under it.
    #[must_use]
    pub fn with_merged_modifier(mut self, modifier: Modifier, name: &str) -> Self {
        self.total = Some(match self.total.take() {
            Some(total) => total.add(&modifier),
            None => modifier.clone(),
        });
        self.modifiers
            .entry(name.to_string())
            .and_modify(|existing| *existing = existing.add(&modifier))
            .or_insert(modifier);
        self
    }

    #[must_use]
    pub const fn base(&self) -> i64 {
        self.base
    }

    /// The combined modifier, if any was added.
    #[must_use]
    pub const fn modifier(&self) -> Option<&Modifier> {
        self.total.as_ref()
    }

    #[must_use]
    pub const fn modifiers(&self) -> &BTreeMap<String, Modifier> {
        &self.modifiers
    }

    #[must_use]
    pub fn min_value(&self) -> i64 {
        self.base + self.total.as_ref().map_or(0, Modifier::min_value)
    }

    #[must_use]
    pub fn max_value(&self) -> i64 {
        self.base + self.total.as_ref().map_or(0, Modifier::max_value)
    }

    /// Whether conditional modifiers make the value a range.
    #[must_use]
    pub fn has_conditions(&self) -> bool {
        self.min_value() != self.max_value()
    }
}

impl fmt::Display for ModifiedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (min, max) = (self.min_value(), self.max_value());
        if min == max {
            write!(f, "{min}")
        } else {
            write!(f, "{min}-{max}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Modifier::new(2, ModifierType::Dodge).to_string(), "+2 dodge");
        assert_eq!(Modifier::general(0).to_string(), "+0 general");
        assert_eq!(Modifier::new(-5, ModifierType::Armor).to_string(), "-5 armor");
        let chained = Modifier::new(3, ModifierType::Shield)
            .with_condition("test")
            .chain(Modifier::new(2, ModifierType::Armor));
        assert_eq!(chained.to_string(), "+3 shield if \"test\" +2 armor");
        assert_eq!(chained.bases(), ["+3 shield", "+2 armor"]);
    }

    #[test]
    fn read_cases() {
        let cases: [(&str, Option<&str>, &str); 12] = [
            ("", None, ""),
            ("hello", None, "hello"),
            ("+2 ", Some("+2 general"), " "),
            ("-5 hi", Some("-5 general"), " hi"),
            ("5 dodge", Some("+5 dodge"), ""),
            ("0 armor \"test\"", Some("+0 armor"), " \"test\""),
            ("-3 dodge", Some("-3 dodge"), ""),
            ("+3 armor if \"just a test\"", Some("+3 armor if \"just a test\""), ""),
            ("+3 armor +2 shield", Some("+3 armor +2 shield"), ""),
            ("+3 +2", Some("+3 general +2 general"), ""),
            ("+1 natural armor", Some("+1 natural armor"), ""),
            ("+3 shield if \"test\" +2 armor", Some("+3 shield if \"test\" +2 armor"), ""),
        ];
        for (input, expected, rest) in cases {
            let mut reader = ParseReader::new(input);
            let modifier = Modifier::read(&mut reader);
            assert_eq!(modifier.map(|m| m.to_string()).as_deref(), expected, "{input:?}");
            assert_eq!(reader.rest(), rest, "rest of {input:?}");
        }
    }

    #[test]
    fn stacking_rules() {
        let first = Modifier::new(4, ModifierType::Armor);
        let second = Modifier::new(3, ModifierType::Armor);
        assert!(first.stack_or_more(&second));
        assert!(!second.stack_or_more(&first));
        assert!(!first.stack_or_more(&first));

        let dodge = Modifier::new(2, ModifierType::Dodge);
        assert!(dodge.stack_or_more(&Modifier::new(3, ModifierType::Dodge)));
        assert!(dodge.stack_or_more(&dodge));
        assert!(dodge.stack_or_more_all(&[
            Modifier::new(4, ModifierType::Dodge),
            Modifier::new(5, ModifierType::Armor),
            Modifier::new(6, ModifierType::Shield),
        ]));
        assert!(!second.stack_or_more_all(&[dodge, Modifier::new(4, ModifierType::Armor)]));
        assert!(Modifier::new(-1, ModifierType::Armor).stacks());
    }

    #[test]
    fn add_follows_stacking() {
        let armor = Modifier::new(2, ModifierType::Armor);
        assert_eq!(armor.add(&Modifier::new(3, ModifierType::Armor)).to_string(), "+3 armor");
        let dodge = Modifier::new(2, ModifierType::Dodge);
        assert_eq!(dodge.add(&dodge).to_string(), "+4 dodge");
        let mixed = armor.add(&Modifier::new(1, ModifierType::Shield));
        assert_eq!(mixed.to_string(), "+2 armor +1 shield");
        assert_eq!(mixed.value(), 3);
        let merged = mixed.add(&"+4 armor +2 shield".parse().unwrap());
        assert_eq!(merged.to_string(), "+4 armor +2 shield");
    }

    #[test]
    fn conditional_ranges() {
        let modifier: Modifier = "+2 armor +3 dodge if \"flanking\" -1 general if \"tired\""
            .parse()
            .unwrap();
        assert_eq!(modifier.value(), 4);
        assert_eq!(modifier.min_value(), 1);
        assert_eq!(modifier.max_value(), 5);
    }

    #[test]
    fn ignore_drops_types() {
        let modifier: Modifier = "+2 armor +1 shield -1 armor".parse().unwrap();
        let remaining = modifier.ignore(&[ModifierType::Armor]).unwrap();
        assert_eq!(remaining.to_string(), "+1 shield -1 armor");
        assert_eq!(Modifier::general(1).ignore(&[ModifierType::General]), None);
    }

    #[test]
    fn modified_number_ranges() {
        let number = ModifiedNumber::new(10)
            .with_modifier(Modifier::new(2, ModifierType::Armor), "leather")
            .unwrap()
            .with_modifier(
                Modifier::new(1, ModifierType::Dodge).with_condition("moving"),
                "feat",
            )
            .unwrap();
        assert_eq!(number.to_string(), "12-13");
        assert!(number.has_conditions());
        assert_eq!(number.modifiers().len(), 2);
        assert_eq!(
            number.with_modifier(Modifier::general(1), "feat"),
            Err(ValueError::DuplicateModifier("feat".to_string()))
        );
        assert_eq!(ModifiedNumber::new(7).to_string(), "7");
    }

    #[test]
    fn merged_modifiers_share_a_name() {
        let number = ModifiedNumber::new(0)
            .with_merged_modifier(Modifier::general(2), "ring")
            .with_merged_modifier(Modifier::general(3), "ring");
        assert_eq!(number.modifiers().len(), 1);
        assert_eq!(number.modifiers()["ring"].value(), 5);
        assert_eq!(number.to_string(), "5");
    }
}
