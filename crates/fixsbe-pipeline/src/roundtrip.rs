//! Business-field round-trip verification.
//!
//! Compares the original descriptor against a decoded message under the
//! type-specific tolerance contract: exact for strings and integers,
//! `|Δ| < 10^-3` for scaled decimals (after dividing the wire integer
//! back), exact array lengths for group counts. Fields the schema has no
//! slot for are ignored — the encoder dropped them by design.

use fixsbe_core::{is_session_tag, Descriptor, Node, Tag};
use fixsbe_sbe::{
    value, BlockLayout, DecodedMessage, DecodedValue, SbeType, ScalingOverrides, Semantics,
};
use serde::Serialize;
use std::fmt;

/// Tolerance for scaled-decimal comparisons.
const SCALED_TOLERANCE: f64 = 1e-3;

/// One field that failed the round-trip check.
#[derive(Clone, Debug, Serialize)]
pub struct Mismatch {
    /// Path of the offending field (tags with group indices).
    pub path: Vec<Tag>,
    /// Human-readable description of the disagreement.
    pub detail: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.path, self.detail)
    }
}

/// Compare every business field of `descriptor` against `decoded`.
///
/// Returns the list of mismatches; an empty list is a clean round trip.
#[must_use]
pub fn check_round_trip(
    descriptor: &Descriptor,
    decoded: &DecodedMessage,
    body: &BlockLayout,
    overrides: &ScalingOverrides,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    let mut path = Vec::new();
    check_level(descriptor, decoded, body, overrides, &mut path, &mut mismatches);
    mismatches
}

fn check_level(
    descriptor: &Descriptor,
    decoded: &DecodedMessage,
    body: &BlockLayout,
    overrides: &ScalingOverrides,
    path: &mut Vec<Tag>,
    out: &mut Vec<Mismatch>,
) {
    for (tag, node) in descriptor {
        if is_session_tag(*tag) {
            continue;
        }
        path.push(*tag);
        match node {
            Node::Scalar(expected) => {
                check_scalar(*tag, expected, decoded, body, overrides, path, out);
            }
            Node::Group(entries) => match decoded.get(*tag) {
                Some(DecodedValue::Group(decoded_entries)) => {
                    if decoded_entries.len() != entries.len() {
                        out.push(Mismatch {
                            path: path.clone(),
                            detail: format!(
                                "group count: sent {} entries, decoded {}",
                                entries.len(),
                                decoded_entries.len()
                            ),
                        });
                    } else if let Some(group) = body.group(*tag) {
                        for (k, (sent, got)) in
                            entries.iter().zip(decoded_entries).enumerate()
                        {
                            path.push(k as Tag);
                            check_level(sent, got, &group.body, overrides, path, out);
                            path.pop();
                        }
                    }
                }
                _ => out.push(Mismatch {
                    path: path.clone(),
                    detail: format!("group with {} entries missing from decode", entries.len()),
                }),
            },
        }
        path.pop();
    }
}

fn check_scalar(
    tag: Tag,
    expected: &str,
    decoded: &DecodedMessage,
    body: &BlockLayout,
    overrides: &ScalingOverrides,
    path: &[Tag],
    out: &mut Vec<Mismatch>,
) {
    let mut fail = |detail: String| {
        out.push(Mismatch {
            path: path.to_vec(),
            detail,
        });
    };
    let got = decoded.get(tag);

    if let Some(field) = body.fixed(tag) {
        match (field.ty, field.semantics) {
            (SbeType::Char, _) => match got {
                Some(DecodedValue::Text(s)) if s == expected => {}
                None if expected.is_empty() || expected == "\0" => {}
                other => fail(format!("char: sent {expected:?}, decoded {other:?}")),
            },
            (_, Semantics::Boolean) => {
                let want = value::parse_boolean(expected).ok();
                match (want, got) {
                    (Some(0), None) => {} // false is filtered with the zeros
                    (Some(w), Some(DecodedValue::Uint(g))) if u64::from(w) == *g => {}
                    _ => fail(format!("boolean: sent {expected:?}, decoded {got:?}")),
                }
            }
            (_, Semantics::Scaled(exponent)) => {
                let exponent = overrides_exponent(overrides, tag, exponent);
                let Ok(want) = expected.parse::<f64>() else {
                    fail(format!("decimal: unparseable input {expected:?}"));
                    return;
                };
                match got {
                    Some(DecodedValue::Int(wire)) => {
                        let scale = 10f64.powi(exponent as i32);
                        let delta = (*wire as f64 / scale - want).abs();
                        if delta >= SCALED_TOLERANCE {
                            fail(format!(
                                "decimal: sent {expected:?}, decoded wire {wire} (Δ={delta})"
                            ));
                        }
                    }
                    None if want == 0.0 => {}
                    other => fail(format!("decimal: sent {expected:?}, decoded {other:?}")),
                }
            }
            (_, Semantics::Timestamp) => {
                let want = value::parse_timestamp(expected).ok();
                match (want, got) {
                    (Some(0), None) => {}
                    (Some(w), Some(DecodedValue::Uint(g))) if w == *g => {}
                    _ => fail(format!("timestamp: sent {expected:?}, decoded {got:?}")),
                }
            }
            (SbeType::Double, _) => {
                let want = expected.parse::<f64>().ok();
                match (want, got) {
                    (Some(w), Some(DecodedValue::Float(g))) if (w - g).abs() < f64::EPSILON => {}
                    (Some(w), None) if w == 0.0 => {}
                    _ => fail(format!("float: sent {expected:?}, decoded {got:?}")),
                }
            }
            _ => {
                // Plain integers: exact equality, with zero filtered.
                let want = expected.parse::<i128>().ok();
                let got_num = match got {
                    Some(DecodedValue::Uint(v)) => Some(i128::from(*v)),
                    Some(DecodedValue::Int(v)) => Some(i128::from(*v)),
                    _ => None,
                };
                match (want, got_num) {
                    (Some(0), None) => {}
                    (Some(w), Some(g)) if w == g => {}
                    _ => fail(format!("integer: sent {expected:?}, decoded {got:?}")),
                }
            }
        }
    } else if body.is_scalar_member(tag) {
        // Variable-length string: exact equality, empty is filtered.
        match got {
            Some(DecodedValue::Text(s)) if s == expected => {}
            None if expected.is_empty() => {}
            other => fail(format!("string: sent {expected:?}, decoded {other:?}")),
        }
    }
    // Tags unknown to the layout were dropped at encode time by design.
}

fn overrides_exponent(overrides: &ScalingOverrides, tag: Tag, default: u32) -> u32 {
    overrides.exponent(tag).unwrap_or(default)
}
