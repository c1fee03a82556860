//! DMA Values
//!
//! Typed numeric values for role-playing game content: exact rationals,
//! dice, multi-unit measurements (distance, area, duration, volume, weight and
//! money), stacking modifiers, cost expressions and the aggregation of values
//! over a chain of derived entries.
//!
//! Every value can be read from text, printed back to the same text, and
//! combined with other values of its kind.

pub mod combined;
pub mod comment;
pub mod config;
pub mod dice;
pub mod error;
pub mod expression;
pub mod modifier;
pub mod numbers;
pub mod rational;
pub mod reader;
pub mod record;
pub mod seed;
pub mod units;
pub mod value;

// Re-export commonly used types
pub use combined::{Combined, Contribution, Entry, EntryValue, Node};
pub use comment::Comment;
pub use config::{CommentConfig, EngineConfig, SimplifyLevels};
pub use dice::Dice;
pub use error::{ConfigError, DefinitionError, Result, ValueError};
pub use expression::{Expression, MagicItem, Shared};
pub use modifier::{ModifiedNumber, Modifier, ModifierType};
pub use rational::Rational;
pub use reader::ParseReader;
pub use record::{Record, from_json, to_json};
pub use seed::{DiceBag, derive_stream_seed};
pub use units::{
    Area, Coin, Distance, Duration, Money, Unit, UnitFamily, UnitKind, UnitSet, Units, Volume,
    Weight,
};
pub use value::{Aggregate, Arithmetic, Value, ValueKind};
