//! Local parser for the printed product code.

use crate::catalog::ProductFields;

/// Parse a temple code of the form `<reference> <size1>[]<size2>-<size3> <color>`.
///
/// ```ignore
/// let fields = parse_product_code("0037 54[]18-145 C4").unwrap();
/// assert_eq!(fields.reference, "0037");
/// assert_eq!(fields.color, "C4");
/// ```
pub fn parse_product_code(code: &str) -> Option<ProductFields> {
    let re = regex_lite::Regex::new(
        r"^\s*(\S+)\s+(\d{2,3})\s*(?:\[\s*\]|□|\|)\s*(\d{1,2})\s*-\s*(\d{2,3})\s+(\S+)\s*$",
    )
    .ok()?;
    let caps = re.captures(code)?;

    Some(ProductFields {
        reference: caps.get(1)?.as_str().to_string(),
        size1: caps.get(2)?.as_str().to_string(),
        size2: caps.get(3)?.as_str().to_string(),
        size3: caps.get(4)?.as_str().to_string(),
        color: caps.get(5)?.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_code() {
        let fields = parse_product_code("0037 54[]18-145 C4").unwrap();
        assert_eq!(fields.reference, "0037");
        assert_eq!(fields.size1, "54");
        assert_eq!(fields.size2, "18");
        assert_eq!(fields.size3, "145");
        assert_eq!(fields.color, "C4");
    }

    #[test]
    fn test_parse_tolerates_spacing_and_box_glyph() {
        let fields = parse_product_code("  RX-221  52 □ 17 - 140  C09 ").unwrap();
        assert_eq!(fields.reference, "RX-221");
        assert_eq!(fields.size2, "17");
        assert_eq!(fields.color, "C09");
    }

    #[test]
    fn test_parse_rejects_partial_code() {
        assert!(parse_product_code("0037 54[]18").is_none());
        assert!(parse_product_code("").is_none());
        assert!(parse_product_code("made in italy").is_none());
    }
}
