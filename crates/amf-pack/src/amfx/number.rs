//! Text form of doubles in `<double>` and `<date>` elements.

/// Renders `value` so that [`parse_double`] reads back the same bits, except
/// for NaN payloads.
pub fn render_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value == f64::INFINITY {
        "Infinity".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_owned()
    } else {
        // Debug is the shortest representation that round-trips and keeps
        // the sign of zero.
        format!("{value:?}")
    }
}

/// Parses a double literal. Surrounding whitespace is ignored. Besides the
/// three special tokens only decimal notation is accepted, so spellings such
/// as `inf` or `nan` are rejected.
pub fn parse_double(text: &str) -> Option<f64> {
    match text.trim() {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        other if other.bytes().all(is_decimal_byte) => other.parse().ok(),
        _ => None,
    }
}

fn is_decimal_byte(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')
}
