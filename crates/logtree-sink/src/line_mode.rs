//! crates/logtree-sink/src/line_mode.rs
//! Newline policy shared by the writer-backed sinks.

/// Controls whether a sink terminates each formatted record with a newline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LineMode {
    /// Append a newline unless the formatted text already ends with one.
    #[default]
    WithNewline,
    /// Write the formatted text exactly as produced.
    WithoutNewline,
}

impl LineMode {
    /// Reports whether the mode terminates records with a newline.
    ///
    /// # Examples
    ///
    /// ```
    /// use logtree_sink::LineMode;
    ///
    /// assert!(LineMode::WithNewline.append_newline());
    /// assert!(!LineMode::WithoutNewline.append_newline());
    /// ```
    #[must_use]
    pub const fn append_newline(self) -> bool {
        matches!(self, Self::WithNewline)
    }

    /// Applies the policy to an already formatted record.
    pub(crate) fn terminate(self, mut text: String) -> String {
        if self.append_newline() && !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }
}

impl From<bool> for LineMode {
    fn from(append_newline: bool) -> Self {
        if append_newline {
            Self::WithNewline
        } else {
            Self::WithoutNewline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_newline_never_doubles_terminator() {
        assert_eq!(LineMode::WithNewline.terminate("a".into()), "a\n");
        assert_eq!(LineMode::WithNewline.terminate("a\n".into()), "a\n");
    }

    #[test]
    fn without_newline_is_verbatim() {
        assert_eq!(LineMode::WithoutNewline.terminate("a".into()), "a");
    }

    #[test]
    fn bool_conversion() {
        assert_eq!(LineMode::from(true), LineMode::WithNewline);
        assert_eq!(LineMode::from(false), LineMode::WithoutNewline);
    }
}
