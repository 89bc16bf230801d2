//! Parameter-to-flag translation.
//!
//! Converts parsed message parameters into long-form command-line flags.
//! Keys written in camelCase or snake_case become kebab-case
//! (`dryRun` -> `--dry-run`, `max_depth` -> `--max-depth`).
//!
//! Booleans use presence encoding: `true` emits the bare flag, `false`
//! emits nothing at all. There is no `--no-x` negative form; a boolean
//! parameter cannot express "explicitly false" on the command line. This
//! asymmetry is intentional and must be kept.

use crate::message::Scalar;

/// Convert a camelCase, snake_case, or mixed name to kebab-case.
///
/// Word boundaries are lower-to-upper case transitions and explicit
/// separators (`_` or `-`). Consecutive separators collapse to a single
/// hyphen; leading and trailing separators are dropped; consecutive
/// uppercase letters stay together (`myHTTPServer` -> `my-httpserver`).
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut pending_separator = false;
    let mut prev_lower_or_digit = false;

    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            pending_separator = !out.is_empty();
            prev_lower_or_digit = false;
            continue;
        }
        if ch.is_ascii_uppercase() && prev_lower_or_digit {
            pending_separator = true;
        }
        if pending_separator {
            out.push('-');
            pending_separator = false;
        }
        for lowered in ch.to_lowercase() {
            out.push(lowered);
        }
        prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
    }

    out
}

/// Translate ordered parameters into command-line flags.
///
/// Pure and order-preserving: identical input always yields identical
/// output. Non-boolean scalars become `--key=value`; the downstream
/// executor passes each element as a discrete argv entry, so values are
/// never re-quoted or escaped here.
pub fn translate(parameters: &[(String, Scalar)]) -> Vec<String> {
    let mut flags = Vec::with_capacity(parameters.len());
    for (key, value) in parameters {
        let flag = kebab_case(key);
        match value {
            Scalar::Bool(true) => flags.push(format!("--{flag}")),
            Scalar::Bool(false) => {}
            other => flags.push(format!("--{flag}={other}")),
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_converts_camel_case() {
        assert_eq!(kebab_case("myKey"), "my-key");
        assert_eq!(kebab_case("dayOfYear"), "day-of-year");
        assert_eq!(kebab_case("dryRun"), "dry-run");
    }

    #[test]
    fn kebab_converts_snake_case() {
        assert_eq!(kebab_case("snake_case"), "snake-case");
        assert_eq!(kebab_case("max_depth_limit"), "max-depth-limit");
    }

    #[test]
    fn kebab_is_idempotent_on_kebab_input() {
        assert_eq!(kebab_case("already-kebab"), "already-kebab");
        assert_eq!(kebab_case(kebab_case("someMixed_name").as_str()), "some-mixed-name");
    }

    #[test]
    fn kebab_boundary_cases() {
        assert_eq!(kebab_case(""), "");
        assert_eq!(kebab_case("_leading"), "leading");
        assert_eq!(kebab_case("trailing_"), "trailing");
        assert_eq!(kebab_case("a__b"), "a-b");
        assert_eq!(kebab_case("___"), "");
        assert_eq!(kebab_case("myHTTPServer"), "my-httpserver");
        assert_eq!(kebab_case("day1Of"), "day1-of");
        assert_eq!(kebab_case("X"), "x");
    }

    #[test]
    fn translates_scalars_to_key_value_flags() {
        let params = vec![
            ("environment".to_string(), Scalar::Str("production".into())),
            ("replicas".to_string(), Scalar::Int(3)),
            ("ratio".to_string(), Scalar::Float(0.5)),
        ];
        assert_eq!(
            translate(&params),
            vec!["--environment=production", "--replicas=3", "--ratio=0.5"]
        );
    }

    #[test]
    fn boolean_true_emits_bare_flag() {
        let params = vec![("dryRun".to_string(), Scalar::Bool(true))];
        assert_eq!(translate(&params), vec!["--dry-run"]);
    }

    #[test]
    fn boolean_false_emits_nothing() {
        let params = vec![
            ("verbose".to_string(), Scalar::Bool(false)),
            ("count".to_string(), Scalar::Int(1)),
        ];
        assert_eq!(translate(&params), vec!["--count=1"]);
    }

    #[test]
    fn empty_parameters_yield_empty_argv() {
        assert_eq!(translate(&[]), Vec::<String>::new());
    }

    #[test]
    fn translation_is_deterministic_and_order_preserving() {
        let params = vec![
            ("beta".to_string(), Scalar::Int(2)),
            ("alpha".to_string(), Scalar::Int(1)),
        ];
        let first = translate(&params);
        let second = translate(&params);
        assert_eq!(first, second);
        assert_eq!(first, vec!["--beta=2", "--alpha=1"]);
    }

    #[test]
    fn string_values_pass_through_unescaped() {
        let params = vec![(
            "note".to_string(),
            Scalar::Str("spaces and \"quotes\" stay".into()),
        )];
        assert_eq!(translate(&params), vec!["--note=spaces and \"quotes\" stay"]);
    }
}
