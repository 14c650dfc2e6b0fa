//! Value-carrying switches.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::flag::{Flag, FlagOptions};

/// Coercion applied to an option's raw string value.
pub type ValueParser = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Display order of an option built with explicit config and no order.
pub const DEFAULT_OPTION_ORDER: i32 = 0;

/// Explicit config for a [`CliOption`].
#[derive(Clone, Default)]
pub struct OptionOptions {
    /// Help text.
    pub desc: Option<String>,
    /// Display order; defaults to [`DEFAULT_OPTION_ORDER`].
    pub order: Option<i32>,
    /// Raw default used when the option is absent from argv.
    pub value: Option<String>,
    /// Coercion for both argv values and the default.
    pub parser: Option<ValueParser>,
}

impl fmt::Debug for OptionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionOptions")
            .field("desc", &self.desc)
            .field("order", &self.order)
            .field("value", &self.value)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

/// A named switch that consumes the following argv token as its value.
///
/// # Examples
///
/// ```
/// use command_pipe_core::{CliOption, parsers};
/// use serde_json::json;
///
/// let pattern = CliOption::new("-t, --pattern <globs>")
///     .unwrap()
///     .with_default("src/**,!tests/**")
///     .with_parser(parsers::list);
///
/// assert_eq!(pattern.name(), "pattern");
/// assert_eq!(pattern.parse("a, b"), json!(["a", "b"]));
/// assert_eq!(pattern.default_value(), Some(json!(["src/**", "!tests/**"])));
/// ```
#[derive(Clone)]
pub struct CliOption {
    flag: Flag,
    value: Option<String>,
    parser: Option<ValueParser>,
}

impl CliOption {
    /// Parses a declaration with no default and no coercion.
    pub fn new(declaration: &str) -> Result<Self> {
        Ok(Self {
            flag: Flag::new(declaration)?,
            value: None,
            parser: None,
        })
    }

    /// Parses a declaration and applies explicit config.
    ///
    /// Options configured this way sort before flags unless an order is given.
    pub fn with_options(declaration: &str, options: OptionOptions) -> Result<Self> {
        let flag = Flag::with_options(
            declaration,
            FlagOptions {
                desc: options.desc,
                order: None,
            },
        )?
        .with_order(options.order.unwrap_or(DEFAULT_OPTION_ORDER));
        Ok(Self {
            flag,
            value: options.value,
            parser: options.parser,
        })
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.flag = self.flag.with_description(desc);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.flag = self.flag.with_order(order);
        self
    }

    /// Sets the raw default value.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the value coercion.
    pub fn with_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Switch metadata shared with flags.
    pub fn as_flag(&self) -> &Flag {
        &self.flag
    }

    pub fn name(&self) -> &str {
        self.flag.name()
    }

    pub fn matches(&self, switch: &str) -> bool {
        self.flag.matches(switch)
    }

    pub fn order(&self) -> i32 {
        self.flag.order()
    }

    /// Raw default, before coercion.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Coerced default, if one is configured.
    pub fn default_value(&self) -> Option<Value> {
        self.value.as_deref().map(|raw| self.parse(raw))
    }

    /// Applies the coercion, or returns the raw string.
    pub fn parse(&self, raw: &str) -> Value {
        match &self.parser {
            Some(parser) => parser(raw),
            None => Value::String(raw.to_string()),
        }
    }

    pub(crate) fn shares_name(&self, other: &CliOption) -> bool {
        self.flag.shares_name(&other.flag)
    }

    pub(crate) fn offset_order(&mut self, delta: i32) {
        self.flag.offset_order(delta);
    }
}

impl fmt::Debug for CliOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliOption")
            .field("flag", &self.flag)
            .field("value", &self.value)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::flag::DEFAULT_FLAG_ORDER;
    use crate::parsers;

    #[test]
    fn test_order_defaults() {
        let bare = CliOption::new("--url").unwrap();
        assert_eq!(bare.order(), DEFAULT_FLAG_ORDER);

        let configured = CliOption::with_options(
            "--url",
            OptionOptions {
                value: Some("http://localhost".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(configured.order(), DEFAULT_OPTION_ORDER);
        assert_eq!(configured.value(), Some("http://localhost"));

        let ordered = CliOption::with_options(
            "--url",
            OptionOptions {
                order: Some(7),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(ordered.order(), 7);
    }

    #[test]
    fn test_parse_without_parser_is_identity() {
        let opt = CliOption::new("-s, --source").unwrap().with_default("./");
        assert_eq!(opt.parse("/x"), json!("/x"));
        assert_eq!(opt.default_value(), Some(json!("./")));
    }

    #[test]
    fn test_parser_applies_to_default() {
        let opt = CliOption::with_options(
            "--jobs",
            OptionOptions {
                value: Some("4".into()),
                parser: Some(Arc::new(parsers::int)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(opt.default_value(), Some(json!(4)));
        assert_eq!(opt.parse("12"), json!(12));
    }

    #[test]
    fn test_no_default_means_none() {
        let opt = CliOption::new("--url").unwrap();
        assert_eq!(opt.default_value(), None);
    }
}
