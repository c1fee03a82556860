//! Error types shared by all value kinds.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ValueError>;

/// Errors raised when constructing or combining values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("denominator must not be zero")]
    ZeroDenominator,
    #[error("division by zero")]
    DivisionByZero,
    #[error("could not parse {kind} from '{text}'")]
    Parse { kind: &'static str, text: String },
    #[error("cannot add dice with {left} and {right} sides")]
    IncompatibleDice { left: i64, right: i64 },
    #[error("cannot combine {left} with {right}")]
    IncompatibleKinds {
        left: &'static str,
        right: &'static str,
    },
    #[error("unit set index {index} out of range (family has {len} sets)")]
    UnknownSet { index: usize, len: usize },
    #[error("{kind} slot count {given} does not match set '{set}' with {expected} units")]
    SlotMismatch {
        kind: &'static str,
        set: String,
        given: usize,
        expected: usize,
    },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: i64 },
    #[error("{field} must be at most {max} (got {value})")]
    TooLarge {
        field: &'static str,
        max: i64,
        value: i64,
    },
    #[error("caster level {caster_level} too low for spell level {spell_level} (minimum {minimum})")]
    InvalidCasterLevel {
        spell_level: i64,
        caster_level: i64,
        minimum: i64,
    },
    #[error("unknown magic item '{0}'")]
    UnknownMagicItem(String),
    #[error("comment text must only contain lines starting with '{starter}'")]
    InvalidComment { starter: String },
    #[error("not enough money: {0}")]
    InsufficientFunds(String),
    #[error("modifier '{0}' is already present")]
    DuplicateModifier(String),
    #[error("invalid record: {0}")]
    Record(String),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Errors raised while parsing a declarative unit definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("expected '{expected}' in definition '{context}'")]
    Expected {
        expected: &'static str,
        context: String,
    },
    #[error("invalid factor '{0}' (expected mult/div with positive integers)")]
    InvalidFactor(String),
    #[error("set '{0}' has no units")]
    EmptySet(String),
    #[error("set '{set}' must have exactly one base unit (found {found})")]
    BaseUnit { set: String, found: usize },
    #[error("duplicate unit name '{name}' in set '{set}'")]
    DuplicateName { set: String, name: String },
    #[error("definition contains no sets")]
    NoSets,
}

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("comment starter must not be empty")]
    EmptyCommentStarter,
    #[error("invalid configuration JSON: {0}")]
    Json(String),
}
