//! Incoming message parser.
//!
//! A message is a small TOML block: exactly one top-level section naming the
//! action, followed by flat key-value parameters:
//!
//! ```toml
//! [deploy]
//! environment = "production"
//! dryRun = true
//! ```
//!
//! Only scalar parameter values are accepted (strings, integers, floats,
//! booleans). Nested tables, arrays, and datetimes are rejected; this is a
//! deliberate restriction of the message format, not an oversight. Parameter
//! order is preserved so the resulting command line is deterministic.

use std::fmt;
use thiserror::Error;

/// A scalar parameter value, typed by its TOML literal form.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    /// Canonical string form: strings pass through unescaped, numbers render
    /// in plain decimal, booleans as `true`/`false`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// One parsed message: the action name and its parameters in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    pub action: String,
    pub parameters: Vec<(String, Scalar)>,
}

/// Structural problems with an incoming message.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("message is not valid TOML: {0}")]
    Syntax(String),

    #[error("message contains no action section")]
    NoSection,

    #[error("message contains {0} action sections, expected exactly one")]
    MultipleSections(usize),

    #[error("top-level value '{0}' does not belong to an action section")]
    StrayValue(String),

    #[error(
        "parameter '{key}' has unsupported type '{type_name}'; \
         only strings, integers, floats, and booleans are allowed"
    )]
    UnsupportedValue { key: String, type_name: String },
}

/// Parse a raw message into an action name and ordered scalar parameters.
///
/// Duplicate parameter keys are rejected by the TOML grammar itself and
/// surface as [`ParseError::Syntax`].
pub fn parse_message(raw: &str) -> Result<ParsedMessage, ParseError> {
    let table: toml::Table = raw
        .trim()
        .parse()
        .map_err(|e: toml::de::Error| ParseError::Syntax(e.message().to_string()))?;

    let mut action: Option<(String, toml::Table)> = None;
    let mut sections = 0usize;
    for (key, value) in table {
        match value {
            toml::Value::Table(section) => {
                sections += 1;
                if action.is_none() {
                    action = Some((key, section));
                }
            }
            _ => return Err(ParseError::StrayValue(key)),
        }
    }

    if sections > 1 {
        return Err(ParseError::MultipleSections(sections));
    }
    let Some((action, section)) = action else {
        return Err(ParseError::NoSection);
    };

    let mut parameters = Vec::with_capacity(section.len());
    for (key, value) in section {
        let scalar = match value {
            toml::Value::String(s) => Scalar::Str(s),
            toml::Value::Integer(i) => Scalar::Int(i),
            toml::Value::Float(x) => Scalar::Float(x),
            toml::Value::Boolean(b) => Scalar::Bool(b),
            other => {
                return Err(ParseError::UnsupportedValue {
                    key,
                    type_name: other.type_str().to_string(),
                });
            }
        };
        parameters.push((key, scalar));
    }

    Ok(ParsedMessage { action, parameters })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_section_with_scalars() {
        let msg = parse_message(
            "[deploy]\nenvironment = \"production\"\nreplicas = 3\nratio = 0.5\nforce = true",
        )
        .unwrap();

        assert_eq!(msg.action, "deploy");
        assert_eq!(
            msg.parameters,
            vec![
                ("environment".to_string(), Scalar::Str("production".into())),
                ("replicas".to_string(), Scalar::Int(3)),
                ("ratio".to_string(), Scalar::Float(0.5)),
                ("force".to_string(), Scalar::Bool(true)),
            ]
        );
    }

    #[test]
    fn parses_section_with_no_parameters() {
        let msg = parse_message("[status]").unwrap();
        assert_eq!(msg.action, "status");
        assert!(msg.parameters.is_empty());
    }

    #[test]
    fn preserves_parameter_order() {
        let msg = parse_message("[run]\nzebra = 1\nalpha = 2\nmiddle = 3").unwrap();
        let keys: Vec<&str> = msg.parameters.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zebra", "alpha", "middle"]);
    }

    #[test]
    fn rejects_plain_text() {
        let err = parse_message("hello there, how are you?").unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn rejects_empty_message() {
        assert_eq!(parse_message("").unwrap_err(), ParseError::NoSection);
        assert_eq!(parse_message("   \n  ").unwrap_err(), ParseError::NoSection);
    }

    #[test]
    fn rejects_multiple_sections() {
        let err = parse_message("[deploy]\nx = 1\n\n[restart]\ny = 2").unwrap_err();
        assert_eq!(err, ParseError::MultipleSections(2));
    }

    #[test]
    fn rejects_stray_top_level_value() {
        let err = parse_message("stray = 1\n[deploy]\nx = 2").unwrap_err();
        assert_eq!(err, ParseError::StrayValue("stray".to_string()));
    }

    #[test]
    fn rejects_nested_table_parameter() {
        let err = parse_message("[deploy]\n[deploy.nested]\nx = 1").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedValue {
                key: "nested".to_string(),
                type_name: "table".to_string(),
            }
        );
    }

    #[test]
    fn rejects_array_parameter() {
        let err = parse_message("[deploy]\nhosts = [\"a\", \"b\"]").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedValue {
                key: "hosts".to_string(),
                type_name: "array".to_string(),
            }
        );
    }

    #[test]
    fn rejects_datetime_parameter() {
        let err = parse_message("[deploy]\nwhen = 2024-01-01T00:00:00Z").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedValue {
                key: "when".to_string(),
                type_name: "datetime".to_string(),
            }
        );
    }

    #[test]
    fn rejects_duplicate_keys() {
        // Strict TOML: duplicate keys are a syntax error, not last-wins.
        let err = parse_message("[deploy]\nx = 1\nx = 2").unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn quoted_and_bare_literals_keep_their_types() {
        let msg = parse_message("[t]\na = \"5\"\nb = 5\nc = 5.0\nd = false").unwrap();
        assert_eq!(msg.parameters[0].1, Scalar::Str("5".into()));
        assert_eq!(msg.parameters[1].1, Scalar::Int(5));
        assert_eq!(msg.parameters[2].1, Scalar::Float(5.0));
        assert_eq!(msg.parameters[3].1, Scalar::Bool(false));
    }

    #[test]
    fn action_name_is_taken_verbatim() {
        let msg = parse_message("[Notification]\nmessage = \"hi\"").unwrap();
        assert_eq!(msg.action, "Notification");
    }

    #[test]
    fn scalar_display_is_canonical() {
        assert_eq!(Scalar::Str("text".into()).to_string(), "text");
        assert_eq!(Scalar::Int(-42).to_string(), "-42");
        assert_eq!(Scalar::Float(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
    }
}
