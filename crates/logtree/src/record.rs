//! crates/logtree/src/record.rs
//! Immutable snapshot of one logging event and its argument container.

use std::panic::Location;
use std::sync::OnceLock;

use serde_json::{Map, Value};
use time::{OffsetDateTime, UtcOffset};

use crate::level::Level;

/// Substitution arguments passed alongside a message template.
///
/// Positional values fill `%s`-style placeholders in order. The optional
/// extra-fields map is merged onto the resulting [`LogRecord`] and becomes
/// addressable from formatter templates (`%(statusCode)s`) without changing
/// the merged message text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
    extra: Map<String, Value>,
}

impl Args {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Replaces the extra-fields container.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Adds a single extra field.
    pub fn extra_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Positional values in call order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Extra fields to merge onto the record.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Splits the arguments into positional values and extra fields.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, Map<String, Value>) {
        (self.values, self.extra)
    }
}

impl From<()> for Args {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self {
            values,
            extra: Map::new(),
        }
    }
}

impl From<Map<String, Value>> for Args {
    fn from(extra: Map<String, Value>) -> Self {
        Self::new().with_extra(extra)
    }
}

/// Builds an [`Args`] list from any values `serde_json::json!` accepts.
///
/// ```
/// use logtree::args;
///
/// let args = args!["disk", 93];
/// assert_eq!(args.values().len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::from(::std::vec![$($crate::__serde_json::json!($value)),+])
    };
}

/// Everything a [`RecordFactory`] needs to build a record.
#[derive(Clone, Debug)]
pub struct RecordParts {
    /// Name of the logger that accepted the event.
    pub name: String,
    /// Severity of the event.
    pub level: Level,
    /// Raw message template.
    pub msg: String,
    /// Substitution arguments and extra fields.
    pub args: Args,
    /// Call site of the emission method, `file:line:column`.
    pub trace: String,
    /// Whether the event came from [`Logger::exception`](crate::Logger::exception).
    pub exception: bool,
}

/// Builds [`LogRecord`]s for every logger owned by a manager.
///
/// Installed through [`Manager::set_log_record_class`](crate::Manager::set_log_record_class).
/// Closures with the matching signature implement the trait.
pub trait RecordFactory: Send + Sync {
    /// Creates the record for one admitted event.
    fn make_record(&self, parts: RecordParts) -> LogRecord;
}

impl<F> RecordFactory for F
where
    F: Fn(RecordParts) -> LogRecord + Send + Sync,
{
    fn make_record(&self, parts: RecordParts) -> LogRecord {
        self(parts)
    }
}

/// Factory that builds plain [`LogRecord`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRecordFactory;

impl RecordFactory for DefaultRecordFactory {
    fn make_record(&self, parts: RecordParts) -> LogRecord {
        LogRecord::from_parts(parts)
    }
}

/// Immutable snapshot of one logging event.
///
/// Records are created once per admitted event, passed by reference through
/// filters, handlers and formatters, and dropped when dispatch completes.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    name: String,
    level: Level,
    msg: String,
    args: Vec<Value>,
    extra: Map<String, Value>,
    created: OffsetDateTime,
    trace: String,
    exception: bool,
}

impl LogRecord {
    /// Creates a record stamped with the current time and the caller's location.
    #[track_caller]
    pub fn new(
        name: impl Into<String>,
        level: Level,
        msg: impl Into<String>,
        args: impl Into<Args>,
    ) -> Self {
        Self::from_parts(RecordParts {
            name: name.into(),
            level,
            msg: msg.into(),
            args: args.into(),
            trace: Location::caller().to_string(),
            exception: false,
        })
    }

    /// Creates a record from factory inputs, stamping the current time.
    #[must_use]
    pub fn from_parts(parts: RecordParts) -> Self {
        let (args, extra) = parts.args.into_parts();
        Self {
            name: parts.name,
            level: parts.level,
            msg: parts.msg,
            args,
            extra,
            created: now(),
            trace: parts.trace,
            exception: parts.exception,
        }
    }

    /// Overrides the creation timestamp.
    #[must_use]
    pub fn with_created(mut self, created: OffsetDateTime) -> Self {
        self.created = created;
        self
    }

    /// Name of the originating logger.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Severity of the event.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Canonical name of [`level`](Self::level).
    #[must_use]
    pub const fn level_name(&self) -> &'static str {
        self.level.name()
    }

    /// Raw message template.
    #[must_use]
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Positional substitution arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Extra fields merged onto the record.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created(&self) -> OffsetDateTime {
        self.created
    }

    /// Call site captured when the record was emitted.
    #[must_use]
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// Whether the record was emitted through `exception`.
    #[must_use]
    pub const fn is_exception(&self) -> bool {
        self.exception
    }

    /// Returns the message with every argument substituted.
    ///
    /// # Examples
    ///
    /// ```
    /// use logtree::{args, Level, LogRecord};
    ///
    /// let record = LogRecord::new("app", Level::Info, "x=%s y=%s", args!["1", "2"]);
    /// assert_eq!(record.get_message(), "x=1 y=2");
    /// ```
    #[must_use]
    pub fn get_message(&self) -> String {
        merge_message(&self.msg, &self.args)
    }

    /// Reads a named field as text.
    ///
    /// Built-in fields take precedence over extra fields of the same name.
    /// Time fields (`asctime`, `date`) are rendered by the formatter, not here.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            "levelname" => Some(self.level.name().to_owned()),
            "levelno" | "level" => Some(self.level.as_u8().to_string()),
            "msg" | "message" => Some(self.get_message()),
            "trace" => Some(self.trace.clone()),
            "created" => Some(format_created(self.created)),
            _ => self.extra.get(name).map(display_value),
        }
    }
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Offset applied to every record timestamp in this process.
///
/// Resolved once, on first use, and then fixed. The `time` crate refuses to
/// read the local offset once other threads are running on some Unix
/// platforms; if that first read fails every record uses UTC instead.
/// [`Manager::new`](crate::Manager::new) resolves it so that processes which
/// set up logging before spawning threads get local time.
pub(crate) fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

fn format_created(created: OffsetDateTime) -> String {
    let millis = created.unix_timestamp_nanos() / 1_000_000;
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    format!("{sign}{}.{:03}", millis / 1000, millis % 1000)
}

/// Substitutes printf-style placeholders in `template` with `args`.
///
/// `%s` uses the string form, `%d`/`%i` integers, `%f` floats, `%j`/`%o`/`%O`
/// JSON and `%%` a literal percent sign. Unused arguments are appended,
/// separated by spaces. With no arguments the template is returned verbatim.
pub(crate) fn merge_message(template: &str, args: &[Value]) -> String {
    if args.is_empty() {
        return template.to_owned();
    }

    let mut out = String::with_capacity(template.len());
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let Some(&spec) = chars.peek() else {
            out.push('%');
            break;
        };
        match spec {
            '%' => {
                chars.next();
                out.push('%');
            }
            's' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O' => {
                chars.next();
                match remaining.next() {
                    Some(value) => out.push_str(&convert(spec, value)),
                    None => {
                        out.push('%');
                        out.push(spec);
                    }
                }
            }
            _ => out.push('%'),
        }
    }

    for value in remaining {
        out.push(' ');
        out.push_str(&display_value(value));
    }
    out
}

fn convert(spec: char, value: &Value) -> String {
    match spec {
        's' => display_value(value),
        'd' => exact_integer(value)
            .or_else(|| numeric(value).map(format_number))
            .unwrap_or_else(|| "NaN".to_owned()),
        'i' => exact_integer(value)
            .or_else(|| numeric(value).map(|n| format_number(n.trunc())))
            .unwrap_or_else(|| "NaN".to_owned()),
        'f' => numeric(value).map_or_else(|| "NaN".to_owned(), |n| n.to_string()),
        _ => value.to_string(),
    }
}

/// String form of a value: strings unquoted, everything else as JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Integers stored exactly in a JSON number, printed without going through `f64`.
fn exact_integer(value: &Value) -> Option<String> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64()
        .map(|v| v.to_string())
        .or_else(|| n.as_u64().map(|v| v.to_string()))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::Null => Some(0.0),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(msg: &str, args: Args) -> LogRecord {
        LogRecord::new("app.sub", Level::Info, msg, args)
    }

    #[test]
    fn message_without_args_is_verbatim() {
        assert_eq!(record("100%% done %s", Args::new()).get_message(), "100%% done %s");
    }

    #[test]
    fn string_placeholders_substitute_in_order() {
        let rec = record("x=%s y=%s", args!["1", "2"]);
        assert_eq!(rec.get_message(), "x=1 y=2");
    }

    #[test]
    fn numeric_placeholders_convert() {
        assert_eq!(record("%d", args![42]).get_message(), "42");
        assert_eq!(record("%d", args!["7"]).get_message(), "7");
        assert_eq!(record("%d", args!["seven"]).get_message(), "NaN");
        assert_eq!(record("%i", args![3.9]).get_message(), "3");
        assert_eq!(record("%f", args![1.5]).get_message(), "1.5");
    }

    #[test]
    fn json_placeholder_quotes_strings() {
        let rec = record("payload %j", args![json!({"k": "v"})]);
        assert_eq!(rec.get_message(), r#"payload {"k":"v"}"#);
    }

    #[test]
    fn surplus_args_are_appended() {
        let rec = record("got", args!["a", 1, true]);
        assert_eq!(rec.get_message(), "got a 1 true");
    }

    #[test]
    fn missing_args_leave_placeholder() {
        let rec = record("%s and %s", args!["one"]);
        assert_eq!(rec.get_message(), "one and %s");
    }

    #[test]
    fn escaped_percent_with_args() {
        let rec = record("%d%% of %s", args![50, "disk"]);
        assert_eq!(rec.get_message(), "50% of disk");
    }

    #[test]
    fn extra_fields_do_not_alter_message() {
        let args = args!["1", "2"].extra_field("statusCode", 404);
        let rec = record("x=%s y=%s", args);
        assert_eq!(rec.get_message(), "x=1 y=2");
        assert_eq!(rec.field("statusCode").as_deref(), Some("404"));
        assert_eq!(rec.extra().len(), 1);
    }

    #[test]
    fn builtin_fields_shadow_extra_fields() {
        let rec = record("hi", Args::new().extra_field("name", "spoofed"));
        assert_eq!(rec.field("name").as_deref(), Some("app.sub"));
    }

    #[test]
    fn fields_expose_level_information() {
        let rec = LogRecord::new("svc", Level::Warning, "careful", ());
        assert_eq!(rec.field("levelname").as_deref(), Some("WARN"));
        assert_eq!(rec.field("levelno").as_deref(), Some("30"));
        assert_eq!(rec.field("level").as_deref(), Some("30"));
        assert_eq!(rec.field("missing"), None);
    }

    #[test]
    fn trace_captures_call_site() {
        let rec = LogRecord::new("svc", Level::Info, "here", ());
        assert!(rec.trace().contains("record.rs"), "trace was {}", rec.trace());
    }

    #[test]
    fn closures_act_as_record_factories() {
        let factory = |mut parts: RecordParts| {
            parts.msg = format!("[tagged] {}", parts.msg);
            LogRecord::from_parts(parts)
        };
        let rec = factory.make_record(RecordParts {
            name: "svc".into(),
            level: Level::Info,
            msg: "hello".into(),
            args: Args::new(),
            trace: String::new(),
            exception: false,
        });
        assert_eq!(rec.get_message(), "[tagged] hello");
    }

    #[test]
    fn integer_placeholders_keep_large_values_exact() {
        let rec = record("%d|%s|%i", args![9_007_199_254_740_993_i64]);
        assert_eq!(
            rec.get_message(),
            "9007199254740993|9007199254740993|9007199254740993"
        );
        assert_eq!(record("%d", args![u64::MAX]).get_message(), "18446744073709551615");
        assert_eq!(record("%i", args![i64::MIN]).get_message(), "-9223372036854775808");
        assert_eq!(record("%i", args![-3.9]).get_message(), "-3");
    }

    #[test]
    fn created_keeps_sign_below_one_second() {
        let created = OffsetDateTime::from_unix_timestamp_nanos(-500_000_000).unwrap();
        let rec = record("t", Args::new()).with_created(created);
        assert_eq!(rec.field("created").as_deref(), Some("-0.500"));

        let created = OffsetDateTime::from_unix_timestamp_nanos(-1_250_000_000).unwrap();
        let rec = record("t", Args::new()).with_created(created);
        assert_eq!(rec.field("created").as_deref(), Some("-1.250"));
    }

    #[test]
    fn timestamps_share_one_offset_across_threads() {
        let offset = local_offset();
        let here = record("main", Args::new()).created().offset();
        let there = std::thread::spawn(|| record("worker", Args::new()).created().offset())
            .join()
            .unwrap();
        assert_eq!(here, offset);
        assert_eq!(there, offset);
    }

    #[test]
    fn created_renders_with_millis() {
        let created = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let rec = record("t", Args::new()).with_created(created);
        assert_eq!(rec.field("created").as_deref(), Some("1700000000.000"));
    }
}
