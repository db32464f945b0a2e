//! Utility functions for id generation and lenient number parsing

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Parses form text as a float. Empty or malformed text, and non-finite
/// results, read as zero.
pub fn parse_lenient(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parse_coerces_garbage_to_zero() {
        assert_eq!(parse_lenient("270.00"), 270.0);
        assert_eq!(parse_lenient(" 23 "), 23.0);
        assert_eq!(parse_lenient("-5"), -5.0);
        assert_eq!(parse_lenient("abc"), 0.0);
        assert_eq!(parse_lenient(""), 0.0);
        assert_eq!(parse_lenient("NaN"), 0.0);
        assert_eq!(parse_lenient("inf"), 0.0);
    }
}
