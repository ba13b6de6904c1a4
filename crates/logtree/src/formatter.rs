//! crates/logtree/src/formatter.rs
//! Template-driven conversion of [`LogRecord`]s into text.

mod template;

use std::fmt;

use time::{OffsetDateTime, format_description};

use crate::error::{LoggingError, Result};
use crate::record::LogRecord;

use template::{Template, TemplateToken};

/// Template applied when a formatter is built without one.
pub const DEFAULT_FORMAT: &str = "%(levelname)s:%(name)s:%(msg)s\n";

/// Date pattern used for `%(asctime)s` when none is configured.
///
/// Patterns use the `time` crate's format description syntax.
pub const DEFAULT_DATE_FORMAT: &str =
    "[year]-[month]-[day] [hour]:[minute]:[second],[subsecond digits:3]";

/// Renders a record into text.
///
/// [`Formatter`] is the stock implementation. Handlers hold formatters as
/// `Arc<dyn Format>` so one instance can be shared between several sinks and
/// decorating formatters (colour, prefixes) can wrap the stock one.
pub trait Format: Send + Sync {
    /// Formats `record`, using `template` instead of the configured template
    /// when one is supplied.
    fn format(&self, record: &LogRecord, template: Option<&str>) -> String;
}

/// `%(field)X` template formatter.
///
/// Recognised fields are `name`, `levelname`, `levelno`/`level`,
/// `msg`/`message` (the argument-merged message), `asctime`/`date`, `trace`,
/// `created` and any extra field carried by the record. Placeholders naming
/// an unknown field are left in the output unchanged.
///
/// # Examples
///
/// ```
/// use logtree::{args, Format, Formatter, Level, LogRecord};
///
/// let formatter = Formatter::new("%(levelname)s:%(name)s:%(msg)s");
/// let record = LogRecord::new("app.sub", Level::Info, "value=%s", args![42]);
/// assert_eq!(formatter.format(&record, None), "INFO:app.sub:value=42");
/// ```
#[derive(Clone)]
pub struct Formatter {
    source: String,
    template: Template,
    date_format: Option<String>,
}

impl Formatter {
    /// Creates a formatter for `template` using the default date pattern.
    pub fn new(template: impl Into<String>) -> Self {
        let source = template.into();
        let template = Template::parse(&source);
        Self {
            source,
            template,
            date_format: None,
        }
    }

    /// Sets the date pattern used by `%(asctime)s`.
    ///
    /// The pattern is validated eagerly so bad configuration fails here
    /// rather than at emission time.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Result<Self> {
        let date_format = date_format.into();
        render_time(OffsetDateTime::UNIX_EPOCH, &date_format)?;
        self.date_format = Some(date_format);
        Ok(self)
    }

    /// The template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.source
    }

    /// The configured date pattern, if any.
    #[must_use]
    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    /// Renders one field of `record`.
    ///
    /// Time fields go through [`format_time`](Self::format_time), message
    /// fields through [`LogRecord::get_message`], and everything else is read
    /// off the record by name.
    pub fn format_field(&self, record: &LogRecord, name: &str) -> Result<String> {
        match name {
            "asctime" | "date" => self.format_time(record, None),
            _ => record
                .field(name)
                .ok_or_else(|| LoggingError::UnknownField(name.to_owned())),
        }
    }

    /// Renders the record's creation time with `date_format`, the configured
    /// pattern, or [`DEFAULT_DATE_FORMAT`], in that order of preference.
    pub fn format_time(&self, record: &LogRecord, date_format: Option<&str>) -> Result<String> {
        let pattern = date_format
            .or(self.date_format.as_deref())
            .unwrap_or(DEFAULT_DATE_FORMAT);
        render_time(record.created(), pattern)
    }

    fn render(&self, record: &LogRecord, template: &Template) -> String {
        let mut out = String::new();
        for token in template.tokens() {
            match token {
                TemplateToken::Literal(text) => out.push_str(text),
                TemplateToken::Field { name, raw } => match self.format_field(record, name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => out.push_str(raw),
                },
            }
        }
        out
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter")
            .field("template", &self.source)
            .field("date_format", &self.date_format)
            .finish()
    }
}

impl Format for Formatter {
    fn format(&self, record: &LogRecord, template: Option<&str>) -> String {
        match template {
            Some(text) => self.render(record, &Template::parse(text)),
            None => self.render(record, &self.template),
        }
    }
}

fn render_time(created: OffsetDateTime, pattern: &str) -> Result<String> {
    let invalid = |reason: String| LoggingError::InvalidDateFormat {
        format: pattern.to_owned(),
        reason,
    };
    let items = format_description::parse(pattern).map_err(|error| invalid(error.to_string()))?;
    created
        .format(items.as_slice())
        .map_err(|error| invalid(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::level::Level;
    use time::macros::datetime;

    fn record() -> LogRecord {
        LogRecord::new("app.sub", Level::Info, "value=%s", args![42])
            .with_created(datetime!(2016-03-04 05:06:07.089 UTC))
    }

    #[test]
    fn default_template_ends_with_newline() {
        let out = Formatter::default().format(&record(), None);
        assert_eq!(out, "INFO:app.sub:value=42\n");
    }

    #[test]
    fn message_and_msg_are_merged() {
        let formatter = Formatter::new("%(message)s|%(msg)s");
        assert_eq!(formatter.format(&record(), None), "value=42|value=42");
    }

    #[test]
    fn override_template_wins() {
        let formatter = Formatter::default();
        let out = formatter.format(&record(), Some("%(name)s/%(levelno)d"));
        assert_eq!(out, "app.sub/20");
    }

    #[test]
    fn asctime_uses_default_pattern() {
        let formatter = Formatter::new("%(asctime)s");
        assert_eq!(formatter.format(&record(), None), "2016-03-04 05:06:07,089");
    }

    #[test]
    fn date_alias_honours_configured_pattern() {
        let formatter = Formatter::new("%(date)s %(msg)s")
            .with_date_format("[day]-[month repr:short]-[year]")
            .unwrap();
        assert_eq!(formatter.format(&record(), None), "04-Mar-2016 value=42");
    }

    #[test]
    fn format_time_override_takes_precedence() {
        let formatter = Formatter::default()
            .with_date_format("[year]")
            .unwrap();
        let text = formatter.format_time(&record(), Some("[hour]:[minute]")).unwrap();
        assert_eq!(text, "05:06");
    }

    #[test]
    fn invalid_date_format_is_rejected() {
        let result = Formatter::default().with_date_format("[nonsense]");
        assert!(matches!(result, Err(LoggingError::InvalidDateFormat { .. })));
    }

    #[test]
    fn unknown_field_is_an_error_and_stays_verbatim() {
        let formatter = Formatter::new("%(missing)s:%(msg)s");
        assert!(matches!(
            formatter.format_field(&record(), "missing"),
            Err(LoggingError::UnknownField(name)) if name == "missing"
        ));
        assert_eq!(formatter.format(&record(), None), "%(missing)s:value=42");
    }

    #[test]
    fn extra_fields_are_addressable() {
        let rec = LogRecord::new(
            "http",
            Level::Warning,
            "slow request",
            args![].extra_field("statusCode", 503),
        );
        let formatter = Formatter::new("%(statusCode)s %(levelname)s %(message)s");
        assert_eq!(formatter.format(&rec, None), "503 WARN slow request");
    }
}
