//! crates/logtree/src/level.rs
//! Severity levels and their bidirectional name/number table.

use std::fmt;
use std::str::FromStr;

use crate::error::{LoggingError, Result};

/// Severity of a logging event.
///
/// Levels are totally ordered by their numeric weight. [`Level::NotSet`]
/// carries weight zero and means "inherit from the nearest ancestor" when set
/// on a logger, or "admit everything" when set on a handler.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Weight 0: no explicit level.
    #[default]
    NotSet = 0,
    /// Weight 10: detailed diagnostics.
    Debug = 10,
    /// Weight 20: routine progress.
    Info = 20,
    /// Weight 30: something unexpected that the program survived.
    Warning = 30,
    /// Weight 40: an operation failed.
    Error = 40,
    /// Weight 50: the program may not be able to continue.
    Critical = 50,
}

/// `CRITICAL` (50).
pub const CRITICAL: Level = Level::Critical;
/// `FATAL` (50), alias of [`CRITICAL`].
pub const FATAL: Level = Level::Critical;
/// `ERROR` (40).
pub const ERROR: Level = Level::Error;
/// `EXCEPTION` (40), alias of [`ERROR`].
pub const EXCEPTION: Level = Level::Error;
/// `WARNING` (30).
pub const WARNING: Level = Level::Warning;
/// `WARN` (30), alias of [`WARNING`].
pub const WARN: Level = Level::Warning;
/// `INFO` (20).
pub const INFO: Level = Level::Info;
/// `DEBUG` (10).
pub const DEBUG: Level = Level::Debug;
/// `NOTSET` (0).
pub const NOTSET: Level = Level::NotSet;

impl Level {
    /// Every level, lowest weight first.
    pub const ALL: [Self; 6] = [
        Self::NotSet,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Returns the numeric weight.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Resolves a numeric weight, returning `None` for unknown values.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NotSet),
            10 => Some(Self::Debug),
            20 => Some(Self::Info),
            30 => Some(Self::Warning),
            40 => Some(Self::Error),
            50 => Some(Self::Critical),
            _ => None,
        }
    }

    /// Returns the canonical name used in formatted output.
    ///
    /// Weight 30 renders as `WARN`, matching the `%(levelname)s` field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotSet => "NOTSET",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Resolves a level name or alias, ignoring ASCII case.
    ///
    /// Decimal strings such as `"30"` resolve like their numeric weight.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed.parse::<u8>().ok().and_then(Self::from_u8);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "NOTSET" => Some(Self::NotSet),
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warning),
            "ERROR" | "EXCEPTION" => Some(Self::Error),
            "CRITICAL" | "FATAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| LoggingError::InvalidLevel(s.to_owned()))
    }
}

impl TryFrom<u8> for Level {
    type Error = LoggingError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or_else(|| LoggingError::InvalidLevel(value.to_string()))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.as_u8()
    }
}

/// Values that can be resolved against the level table.
///
/// Implemented for [`Level`] itself, numeric weights and level names so that
/// configuration surfaces accept whichever form the caller holds.
pub trait AsLevel {
    /// Resolves the value, failing for anything outside the table.
    fn as_level(&self) -> Result<Level>;
}

impl AsLevel for Level {
    fn as_level(&self) -> Result<Level> {
        Ok(*self)
    }
}

impl AsLevel for u8 {
    fn as_level(&self) -> Result<Level> {
        Level::try_from(*self)
    }
}

impl AsLevel for u32 {
    fn as_level(&self) -> Result<Level> {
        u8::try_from(*self)
            .ok()
            .and_then(Level::from_u8)
            .ok_or_else(|| LoggingError::InvalidLevel(self.to_string()))
    }
}

impl AsLevel for i32 {
    fn as_level(&self) -> Result<Level> {
        u8::try_from(*self)
            .ok()
            .and_then(Level::from_u8)
            .ok_or_else(|| LoggingError::InvalidLevel(self.to_string()))
    }
}

impl AsLevel for &str {
    fn as_level(&self) -> Result<Level> {
        self.parse()
    }
}

impl AsLevel for String {
    fn as_level(&self) -> Result<Level> {
        self.parse()
    }
}

/// Validates a level name or number and returns the resolved [`Level`].
///
/// The function is idempotent: feeding its output back in yields the same
/// level.
///
/// # Examples
///
/// ```
/// use logtree::{check_level, Level};
///
/// assert_eq!(check_level("WARNING").unwrap(), Level::Warning);
/// assert_eq!(check_level(40u8).unwrap(), Level::Error);
/// assert!(check_level("LOUD").is_err());
/// ```
pub fn check_level(level: impl AsLevel) -> Result<Level> {
    level.as_level()
}

/// Returns the canonical name for a numeric weight, if it is known.
#[must_use]
pub fn get_level_name(level: u8) -> Option<&'static str> {
    Level::from_u8(level).map(Level::name)
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Level;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for Level {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.name())
        }
    }

    struct LevelVisitor;

    impl Visitor<'_> for LevelVisitor {
        type Value = Level;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a level name or numeric weight")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Level, E> {
            Level::from_name(value)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Level, E> {
            u8::try_from(value)
                .ok()
                .and_then(Level::from_u8)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(value), &self))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Level, E> {
            u8::try_from(value)
                .ok()
                .and_then(Level::from_u8)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(value), &self))
        }
    }

    impl<'de> Deserialize<'de> for Level {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(LevelVisitor)
        }
    }
}
