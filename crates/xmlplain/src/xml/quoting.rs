//! Text content quoting policy

use std::borrow::Cow;

/// Ordered substring substitutions applied to text content.
///
/// Reading applies each `(literal, replacement)` rule as
/// `literal -> replacement`; writing undoes them as
/// `replacement -> literal`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quoting {
    rules: Vec<(String, String)>,
}

impl Quoting {
    /// No substitutions
    pub fn none() -> Self {
        Self::default()
    }

    /// Reader default: drop every `\r`
    pub fn input_default() -> Self {
        Self::none().with_rule("\r", "")
    }

    pub fn with_rule(mut self, literal: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.rules.push((literal.into(), replacement.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[(String, String)] {
        &self.rules
    }

    /// Apply `literal -> replacement` for every rule, in order
    pub fn quote<'a>(&self, content: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(content);
        for (literal, replacement) in &self.rules {
            if !literal.is_empty() && out.contains(literal.as_str()) {
                out = Cow::Owned(out.replace(literal.as_str(), replacement));
            }
        }
        out
    }

    /// Apply `replacement -> literal` for every rule, in order.
    ///
    /// Rules with an empty replacement cannot be undone and are skipped.
    pub fn unquote<'a>(&self, content: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(content);
        for (literal, replacement) in &self.rules {
            if !replacement.is_empty() && out.contains(replacement.as_str()) {
                out = Cow::Owned(out.replace(replacement.as_str(), literal));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_default_drops_carriage_returns() {
        let quoting = Quoting::input_default();
        assert_eq!(quoting.quote("a\r\nb\r"), "a\nb");
        assert!(matches!(quoting.quote("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_none_is_identity() {
        let quoting = Quoting::none();
        assert!(quoting.is_empty());
        assert_eq!(quoting.quote("a\rb"), "a\rb");
        assert_eq!(quoting.unquote("a\rb"), "a\rb");
    }

    #[test]
    fn test_unquote_reverses_rules() {
        let quoting = Quoting::none().with_rule("\r", "<CR>");
        let quoted = quoting.quote("line\r\n");
        assert_eq!(quoted, "line<CR>\n");
        assert_eq!(quoting.unquote(&quoted), "line\r\n");
    }

    #[test]
    fn test_unquote_skips_empty_replacement() {
        let quoting = Quoting::input_default();
        assert_eq!(quoting.unquote("ab"), "ab");
    }
}
