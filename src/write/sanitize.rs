// src/write/sanitize.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Characters that are illegal in file names on at least one common platform.
static ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap());

/// Device names Windows refuses as file stems.
const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest stem in bytes, leaving room under the usual 255-byte name limit
/// for a collision suffix plus `.parquet.tmp`.
pub const MAX_STEM_BYTES: usize = 200;

/// Turn a brand into a file stem safe on every platform.
pub fn sanitize_file_stem(brand: &str) -> String {
    let replaced = ILLEGAL.replace_all(brand, "_");
    let trimmed =
        truncate_bytes(replaced.trim_start(), MAX_STEM_BYTES).trim_end_matches(['.', ' ']);

    let mut stem = if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        trimmed.to_string()
    };

    // Windows rejects `CON`, `con.txt`, `NUL.x.y` alike
    let device = stem.split('.').next().unwrap_or_default().trim_end();
    if RESERVED.contains(&device.to_ascii_uppercase().as_str()) {
        stem.insert(0, '_');
    }
    stem
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Hands out unique file stems. Names are compared case-insensitively; a
/// clash gets the first free `_2`, `_3`, ... suffix.
#[derive(Debug, Default)]
pub struct StemAllocator {
    taken: HashSet<String>,
}

impl StemAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, brand: &str) -> String {
        let base = sanitize_file_stem(brand);
        let mut stem = base.clone();
        let mut n = 2;
        while !self.taken.insert(stem.to_lowercase()) {
            stem = format!("{}_{}", base, n);
            n += 1;
        }
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_brands_are_kept() {
        assert_eq!(sanitize_file_stem("Acme"), "Acme");
        assert_eq!(sanitize_file_stem("L'Oréal"), "L'Oréal");
    }

    #[test]
    fn illegal_characters_are_replaced() {
        assert_eq!(sanitize_file_stem("AC/DC"), "AC_DC");
        assert_eq!(sanitize_file_stem("a:b*c?"), "a_b_c_");
        assert_eq!(sanitize_file_stem("tab\there"), "tab_here");
    }

    #[test]
    fn dots_and_reserved_names() {
        assert_eq!(sanitize_file_stem(".."), "_");
        assert_eq!(sanitize_file_stem("Inc."), "Inc");
        assert_eq!(sanitize_file_stem("con"), "_con");
        assert_eq!(sanitize_file_stem("Console"), "Console");
        assert_eq!(sanitize_file_stem("CON.x"), "_CON.x");
        assert_eq!(sanitize_file_stem("nul.txt"), "_nul.txt");
        assert_eq!(sanitize_file_stem("Com1.Deluxe"), "_Com1.Deluxe");
        assert_eq!(sanitize_file_stem("Conair.pro"), "Conair.pro");
    }

    #[test]
    fn long_brands_are_shortened() {
        let stem = sanitize_file_stem(&"é".repeat(300));
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert_eq!(stem, "é".repeat(MAX_STEM_BYTES / 2));

        // shortened names still go through the collision check
        let mut stems = StemAllocator::new();
        let long = "A".repeat(400);
        let first = stems.allocate(&format!("{}x", long));
        let second = stems.allocate(&format!("{}y", long));
        assert_eq!(first, "A".repeat(MAX_STEM_BYTES));
        assert_eq!(second, format!("{}_2", "A".repeat(MAX_STEM_BYTES)));
    }

    #[test]
    fn collisions_get_suffixes() {
        let mut stems = StemAllocator::new();
        assert_eq!(stems.allocate("A/B"), "A_B");
        assert_eq!(stems.allocate("A:B"), "A_B_2");
        assert_eq!(stems.allocate("a_b"), "a_b_3");
        assert_eq!(stems.allocate("Zeta"), "Zeta");
    }
}
