//! crates/logtree/src/config.rs
//! Declarative level and propagation settings applied to a [`Manager`].

use std::collections::BTreeMap;
use std::env;

use crate::error::{LoggingError, Result};
use crate::level::Level;
use crate::manager::{Manager, ROOT_NAME};

/// Settings that can be parsed from directives, deserialised, or built in
/// code, then applied to a manager in one step.
///
/// # Examples
///
/// ```
/// use logtree::{Level, LoggingConfig, Manager};
///
/// let config = LoggingConfig::parse_directives("warn,app.db=debug").unwrap();
/// let manager = Manager::new();
/// config.apply(&manager).unwrap();
///
/// assert_eq!(manager.root().level(), Level::Warning);
/// assert_eq!(manager.get_logger("app.db").level(), Level::Debug);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoggingConfig {
    /// Level for the root logger.
    pub root_level: Option<Level>,
    /// Global disable floor.
    pub disable: Option<Level>,
    /// Whether the missing-handler notice is written.
    pub raise_exceptions: Option<bool>,
    /// Per-logger levels keyed by dotted name.
    pub levels: BTreeMap<String, Level>,
    /// Per-logger propagation flags keyed by dotted name.
    pub propagate: BTreeMap<String, bool>,
}

impl LoggingConfig {
    /// Parses comma separated directives.
    ///
    /// A bare level (`warn`) sets the root level and `name=level` sets the
    /// level of one logger. Whitespace around tokens and empty segments are
    /// ignored. When the same target appears twice the last one wins.
    pub fn parse_directives(directives: &str) -> Result<Self> {
        let mut config = Self::default();
        for token in directives.split(',').map(str::trim).filter(|token| !token.is_empty()) {
            config.apply_directive(token)?;
        }
        Ok(config)
    }

    /// Reads directives from the environment variable `var`.
    ///
    /// An unset or non-unicode variable yields the default configuration.
    pub fn from_env(var: &str) -> Result<Self> {
        match env::var(var) {
            Ok(directives) => Self::parse_directives(&directives),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Applies a single directive such as `app.db=debug` or `error`.
    pub fn apply_directive(&mut self, token: &str) -> Result<()> {
        let (name, level) = parse_directive(token)?;
        match name {
            None => self.root_level = Some(level),
            Some(name) if name == ROOT_NAME => self.root_level = Some(level),
            Some(name) => {
                self.levels.insert(name.to_owned(), level);
            }
        }
        Ok(())
    }

    /// Pushes every setting into `manager`.
    ///
    /// Loggers are obtained through [`Manager::get_logger`], so naming a
    /// logger here creates it and repairs the tree like any other request.
    pub fn apply(&self, manager: &Manager) -> Result<()> {
        if let Some(level) = self.root_level {
            manager.root().set_level(level);
        }
        if let Some(level) = self.disable {
            manager.disable(level);
        }
        if let Some(raise) = self.raise_exceptions {
            manager.set_raise_exceptions(raise);
        }
        for (name, level) in &self.levels {
            manager.get_logger(checked_name(name)?).set_level(*level);
        }
        for (name, propagate) in &self.propagate {
            manager.get_logger(checked_name(name)?).set_propagate(*propagate);
        }
        Ok(())
    }
}

fn parse_directive(token: &str) -> Result<(Option<&str>, Level)> {
    let Some((name, level)) = token.split_once('=') else {
        return Ok((None, parse_level(token, token)?));
    };
    let name = checked_name(name.trim())
        .map_err(|_| LoggingError::directive(token, "logger name is empty or has an empty segment"))?;
    Ok((Some(name), parse_level(token, level.trim())?))
}

fn parse_level(token: &str, text: &str) -> Result<Level> {
    text.parse::<Level>()
        .map_err(|_| LoggingError::directive(token, format!("unknown level {text:?}")))
}

fn checked_name(name: &str) -> Result<&str> {
    if name.is_empty() || name.split('.').any(str::is_empty) {
        return Err(LoggingError::directive(name, "logger name has an empty segment"));
    }
    Ok(name)
}
