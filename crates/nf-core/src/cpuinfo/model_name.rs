//! Reduce a verbose `model name` value to a compact model token.
//!
//! The model name field tends to be extremely verbose. The most important
//! part of it is assumed to match
//!
//! ```text
//! (Gold |EPYC )?[A-Za-z0-9][A-Za-z-]*[0-9][A-Za-z0-9-]*( v[0-9]+)?
//! ```
//!
//! with the version suffix only considered outside the `Gold`/`EPYC`
//! families. Spaces in the result become underscores:
//!
//! | model name                                   | token        |
//! |----------------------------------------------|--------------|
//! | `Intel(R) Xeon(R) CPU E5-2695 v4 @ 2.10GHz`  | `E5-2695_v4` |
//! | `Intel(R) Xeon(R) Gold 6148 CPU @ 2.40GHz`   | `Gold_6148`  |
//! | `AMD EPYC 7502 32-Core Processor`            | `EPYC_7502`  |

/// Family names kept as part of the token, tried in order.
const FAMILY_LEADINS: [&str; 2] = ["Gold ", "EPYC "];

/// Extract the compact model token from a `model name` value.
///
/// Returns `None` when nothing in the string looks like a model number.
pub fn normalize_model_name(text: &str) -> Option<String> {
    let bytes = text.as_bytes();

    let leadin = FAMILY_LEADINS
        .iter()
        .find_map(|family| text.find(family).map(|at| (at, at + family.len())));

    if let Some((family_start, token_start)) = leadin {
        if let Some(end) = match_model_token(bytes, token_start, false) {
            return Some(underscored(&text[family_start..end]));
        }
    }

    let mut start = 0;
    while start < bytes.len() {
        while start < bytes.len() && !bytes[start].is_ascii_alphanumeric() {
            start += 1;
        }
        if start >= bytes.len() {
            break;
        }
        if let Some(end) = match_model_token(bytes, start, true) {
            return Some(underscored(&text[start..end]));
        }
        start += 1;
    }
    None
}

/// Match one model token starting exactly at `start`; returns its end.
fn match_model_token(bytes: &[u8], start: usize, with_version: bool) -> Option<usize> {
    let at = |i: usize| bytes.get(i).copied().unwrap_or(0);

    if !at(start).is_ascii_alphanumeric() {
        return None;
    }
    let mut end = start + 1;

    // Zero or more letters and dashes.
    while at(end).is_ascii_alphabetic() || at(end) == b'-' {
        end += 1;
    }

    // Exactly one digit.
    if !at(end).is_ascii_digit() {
        return None;
    }
    end += 1;

    // Zero or more alphanumerics and dashes.
    while at(end).is_ascii_alphanumeric() || at(end) == b'-' {
        end += 1;
    }

    // Optional " v<digits>".
    if with_version && at(end) == b' ' && at(end + 1) == b'v' && at(end + 2).is_ascii_digit() {
        end += 2;
        while at(end).is_ascii_digit() {
            end += 1;
        }
    }

    Some(end)
}

fn underscored(span: &str) -> String {
    span.replace(' ', "_")
}
