//! Structural comparison of serialized state.
//!
//! Both sides are converted to `serde_json::Value` and walked together.
//! Every leaf that differs, and every key present on one side only, becomes
//! one [`StateDifference`] with a dotted path (`parts.criticized.trust`,
//! `thoughtBubbles[2].text`). Numbers compare exactly unless the caller
//! passes a [`Tolerance`].

use serde::Serialize;
use serde_json::{Number, Value};

/// How numeric leaves are compared.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Tolerance {
    /// Bit-for-bit equality of the serialized numbers.
    #[default]
    Exact,
    /// Equal when `|a - b| <= epsilon * max(|a|, |b|, 1)`.
    Relative(f64),
}

/// One divergence between expected and actual state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDifference {
    /// Dotted path to the differing value.
    pub path: String,
    /// The recorded value, `null` when missing.
    pub expected: Value,
    /// The replayed value, `null` when missing.
    pub actual: Value,
}

/// Compare two serializable values exactly.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if either value fails to serialize.
pub fn diff_states<T: Serialize>(
    root: &str,
    expected: &T,
    actual: &T,
) -> Result<Vec<StateDifference>, serde_json::Error> {
    diff_states_within(root, expected, actual, Tolerance::Exact)
}

/// Compare two serializable values, numbers within `tolerance`.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if either value fails to serialize.
pub fn diff_states_within<T: Serialize>(
    root: &str,
    expected: &T,
    actual: &T,
    tolerance: Tolerance,
) -> Result<Vec<StateDifference>, serde_json::Error> {
    let expected = serde_json::to_value(expected)?;
    let actual = serde_json::to_value(actual)?;
    Ok(diff_values_within(root, &expected, &actual, tolerance))
}

/// Compare two JSON values exactly.
pub fn diff_values(root: &str, expected: &Value, actual: &Value) -> Vec<StateDifference> {
    diff_values_within(root, expected, actual, Tolerance::Exact)
}

/// Compare two JSON values, numbers within `tolerance`.
pub fn diff_values_within(
    root: &str,
    expected: &Value,
    actual: &Value,
    tolerance: Tolerance,
) -> Vec<StateDifference> {
    let mut out = Vec::new();
    walk(root.to_owned(), expected, actual, tolerance, &mut out);
    out
}

fn numbers_match(left: &Number, right: &Number, tolerance: Tolerance) -> bool {
    match tolerance {
        Tolerance::Exact => left == right,
        Tolerance::Relative(epsilon) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => {
                let scale = a.abs().max(b.abs()).max(1.0);
                (a - b).abs() <= epsilon * scale
            }
            _ => left == right,
        },
    }
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn walk(
    path: String,
    expected: &Value,
    actual: &Value,
    tolerance: Tolerance,
    out: &mut Vec<StateDifference>,
) {
    match (expected, actual) {
        (Value::Object(left), Value::Object(right)) => {
            for (key, value) in left {
                let right_value = right.get(key).unwrap_or(&Value::Null);
                walk(child(&path, key), value, right_value, tolerance, out);
            }
            for (key, value) in right {
                if !left.contains_key(key) {
                    walk(child(&path, key), &Value::Null, value, tolerance, out);
                }
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            let len = left.len().max(right.len());
            for index in 0..len {
                walk(
                    format!("{path}[{index}]"),
                    left.get(index).unwrap_or(&Value::Null),
                    right.get(index).unwrap_or(&Value::Null),
                    tolerance,
                    out,
                );
            }
        }
        (Value::Number(left), Value::Number(right)) => {
            if !numbers_match(left, right, tolerance) {
                out.push(StateDifference {
                    path,
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
        }
        _ if expected == actual => {}
        _ => out.push(StateDifference {
            path,
            expected: expected.clone(),
            actual: actual.clone(),
        }),
    }
}
