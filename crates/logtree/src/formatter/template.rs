//! Token definitions and parser for `%(field)X` templates.

/// Parsed representation of a formatter template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Template {
    tokens: Vec<TemplateToken>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TemplateToken {
    Literal(String),
    Field {
        /// Field name between the parentheses.
        name: String,
        /// The original placeholder text, re-emitted when the field is absent.
        raw: String,
    },
}

impl Template {
    /// Splits `text` into literal runs and `%(name)X` placeholders.
    ///
    /// The conversion character is matched but not interpreted. Anything that
    /// does not form a complete placeholder stays literal.
    pub(crate) fn parse(text: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(start) = rest.find("%(") {
            literal.push_str(&rest[..start]);
            let candidate = &rest[start..];
            match split_placeholder(candidate) {
                Some((name, len)) => {
                    if !literal.is_empty() {
                        tokens.push(TemplateToken::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(TemplateToken::Field {
                        name: name.to_owned(),
                        raw: candidate[..len].to_owned(),
                    });
                    rest = &candidate[len..];
                }
                None => {
                    literal.push('%');
                    rest = &candidate[1..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(TemplateToken::Literal(literal));
        }

        Self { tokens }
    }

    pub(crate) fn tokens(&self) -> impl Iterator<Item = &TemplateToken> {
        self.tokens.iter()
    }
}

/// Returns the field name and the byte length of a placeholder at the start
/// of `text`, which must begin with `%(`.
fn split_placeholder(text: &str) -> Option<(&str, usize)> {
    let body = &text[2..];
    let close = body.find(')')?;
    let name = &body[..close];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let conversion = body[close + 1..].chars().next()?;
    if !conversion.is_ascii_alphabetic() {
        return None;
    }
    Some((name, 2 + close + 1 + conversion.len_utf8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, raw: &str) -> TemplateToken {
        TemplateToken::Field {
            name: name.into(),
            raw: raw.into(),
        }
    }

    #[test]
    fn parses_default_template() {
        let template = Template::parse("%(levelname)s:%(name)s:%(msg)s\n");
        let tokens: Vec<_> = template.tokens().cloned().collect();
        assert_eq!(
            tokens,
            vec![
                field("levelname", "%(levelname)s"),
                TemplateToken::Literal(":".into()),
                field("name", "%(name)s"),
                TemplateToken::Literal(":".into()),
                field("msg", "%(msg)s"),
                TemplateToken::Literal("\n".into()),
            ]
        );
    }

    #[test]
    fn any_conversion_character_is_accepted() {
        let template = Template::parse("%(levelno)d %(statusCode)x");
        assert_eq!(template.tokens().count(), 3);
    }

    #[test]
    fn incomplete_placeholders_stay_literal() {
        for text in ["%(name", "%(name)", "%()s", "%(na me)s", "100%"] {
            let template = Template::parse(text);
            let tokens: Vec<_> = template.tokens().cloned().collect();
            assert_eq!(tokens, vec![TemplateToken::Literal(text.into())], "{text}");
        }
    }

    #[test]
    fn empty_template_has_no_tokens() {
        assert_eq!(Template::parse("").tokens().count(), 0);
    }
}
