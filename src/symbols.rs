//! Grade tokens shown by the portal and their decimal values.

use std::collections::HashMap;

use once_cell::sync::Lazy;

const NUMERIC_GRADES: [(&str, f64); 37] = [
    ("1", 1.0),
    ("1+", 1.25),
    ("1½", 1.5),
    ("2-", 1.75),
    ("2", 2.0),
    ("2+", 2.25),
    ("2½", 2.5),
    ("3-", 2.75),
    ("3", 3.0),
    ("3+", 3.25),
    ("3½", 3.5),
    ("4-", 3.75),
    ("4", 4.0),
    ("4+", 4.25),
    ("4½", 4.5),
    ("5-", 4.75),
    ("5", 5.0),
    ("5+", 5.25),
    ("5½", 5.5),
    ("6-", 5.75),
    ("6", 6.0),
    ("6+", 6.25),
    ("6½", 6.5),
    ("7-", 6.75),
    ("7", 7.0),
    ("7+", 7.25),
    ("7½", 7.5),
    ("8-", 7.75),
    ("8", 8.0),
    ("8+", 8.25),
    ("8½", 8.5),
    ("9-", 8.75),
    ("9", 9.0),
    ("9+", 9.25),
    ("9½", 9.5),
    ("10-", 9.75),
    ("10", 10.0),
];

// Religion class judgements: ottimo, distinto, buono, discreto, sufficiente, insufficiente.
const RELIGION_GRADES: [(&str, f64); 6] = [
    ("o", 10.0),
    ("ds", 9.0),
    ("b", 8.0),
    ("d", 7.0),
    ("s", 6.0),
    ("ins", 5.0),
];

static NUMERIC: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| NUMERIC_GRADES.iter().copied().collect());

static RELIGION: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| RELIGION_GRADES.iter().copied().collect());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub value: f64,
    pub counts_toward_average: bool,
    pub recognized: bool,
}

impl Resolution {
    const UNKNOWN: Resolution = Resolution {
        value: 0.0,
        counts_toward_average: false,
        recognized: false,
    };
}

/// Maps a display token to its value.
///
/// Religion tokens are matched trimmed and case-insensitively and never count
/// toward the average. Numeric tokens must match exactly. Anything else
/// resolves to a zero, non-counting grade.
pub fn resolve(token: &str) -> Resolution {
    if let Some(value) = religion_value(token) {
        return Resolution {
            value,
            counts_toward_average: false,
            recognized: true,
        };
    }

    match NUMERIC.get(token) {
        Some(&value) => Resolution {
            value,
            counts_toward_average: true,
            recognized: true,
        },
        None => Resolution::UNKNOWN,
    }
}

fn religion_value(token: &str) -> Option<f64> {
    RELIGION.get(token.trim().to_lowercase().as_str()).copied()
}

/// Numeric token for an exact value on the quarter-point scale.
pub fn token_for(value: f64) -> Option<&'static str> {
    NUMERIC_GRADES
        .iter()
        .find(|(_, v)| (*v - value).abs() < f64::EPSILON)
        .map(|(token, _)| *token)
}

/// Numeric token closest to `value`, rounding to the nearest quarter point.
pub fn nearest_token(value: f64) -> Option<&'static str> {
    if !value.is_finite() {
        return None;
    }
    let quarter = (value * 4.0).round() / 4.0;
    token_for(quarter.clamp(1.0, 10.0))
}
