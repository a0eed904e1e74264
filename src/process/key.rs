// src/process/key.rs

use crate::table::Cell;

/// Brand used when a cell has no usable first word.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// Split a cell into `(brand, product)`.
///
/// The brand is the first whitespace-delimited word of the trimmed text and
/// the product is everything after the first whitespace run. Inner
/// whitespace of the product is kept as is. Never fails: empty or missing
/// cells map to `("Unknown", "")`.
pub fn parse_brand(cell: &Cell) -> (String, String) {
    let text = cell.to_text();
    split_brand(&text)
}

/// Same as [`parse_brand`] for plain text.
pub fn split_brand(text: &str) -> (String, String) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (UNKNOWN_BRAND.to_string(), String::new());
    }

    match trimmed.find(char::is_whitespace) {
        Some(idx) => {
            let (brand, rest) = trimmed.split_at(idx);
            (brand.to_string(), rest.trim_start().to_string())
        }
        None => (trimmed.to_string(), String::new()),
    }
}
