//! # Ingredient Normalization Module
//!
//! This module parses raw ingredient lines like "200 g Kirschtomaten" into
//! structured components: amount (200.0), unit ("gramm") and a normalized
//! name ("kirschtomate"). All name matching elsewhere in the engine (profile
//! affinities, exclusion lists, shopping aggregation, availability lookups)
//! runs on the normalized form.
//!
//! ## Features
//!
//! - **Regex-based parsing** of German and English ingredient formats
//! - **Unit normalization**: EL → esslöffel, g → gramm, tablespoon → esslöffel
//! - **Filler-word removal**: "frische gehackte Tomaten" → "tomate"
//! - **Plural reduction**: basic German plural to singular (Tomaten → Tomate)
//!
//! ## Usage
//!
//! ```rust
//! use mealplanner::normalize::parse_ingredient;
//!
//! let parsed = parse_ingredient("200 g Kirschtomaten");
//! assert_eq!(parsed.amount, Some(200.0));
//! assert_eq!(parsed.unit.as_deref(), Some("gramm"));
//! assert_eq!(parsed.name, "kirschtomate");
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::model::IngredientEntry;

/// A parsed ingredient line with structured components
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedIngredient {
    /// The original line as it appeared in the recipe
    pub original: String,
    /// Numeric amount, None when the line carries none
    pub amount: Option<f64>,
    /// Normalized unit, None when the line carries none
    pub unit: Option<String>,
    /// Normalized name: lowercase, singular, filler words removed
    pub name: String,
}

impl ParsedIngredient {
    /// Convert into a recipe ingredient entry, keeping the original text
    pub fn into_entry(self) -> IngredientEntry {
        IngredientEntry {
            name: self.name,
            amount: self.amount,
            unit: self.unit,
            raw: self.original,
            is_main: false,
        }
    }
}

lazy_static! {
    /// Unit spellings mapped to their canonical form, German and English
    static ref UNIT_MAPPING: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // German units
        m.insert("el", "esslöffel");
        m.insert("esslöffel", "esslöffel");
        m.insert("tl", "teelöffel");
        m.insert("teelöffel", "teelöffel");
        m.insert("g", "gramm");
        m.insert("gramm", "gramm");
        m.insert("kg", "kilogramm");
        m.insert("kilogramm", "kilogramm");
        m.insert("ml", "milliliter");
        m.insert("milliliter", "milliliter");
        m.insert("l", "liter");
        m.insert("liter", "liter");
        m.insert("stück", "stück");
        m.insert("stk", "stück");
        m.insert("prise", "prise");
        m.insert("prisen", "prise");
        m.insert("bund", "bund");
        m.insert("zehe", "zehe");
        m.insert("zehen", "zehe");
        m.insert("scheibe", "scheibe");
        m.insert("scheiben", "scheibe");
        m.insert("dose", "dose");
        m.insert("dosen", "dose");
        m.insert("becher", "becher");
        m.insert("tasse", "tasse");
        m.insert("tassen", "tasse");
        m.insert("handvoll", "handvoll");
        m.insert("msp", "messerspitze");
        m.insert("messerspitze", "messerspitze");
        m.insert("zweig", "zweig");
        m.insert("zweige", "zweig");
        m.insert("stiel", "stiel");
        m.insert("stiele", "stiel");
        m.insert("blatt", "blatt");
        m.insert("blätter", "blatt");
        // English units
        m.insert("teaspoon", "teelöffel");
        m.insert("teaspoons", "teelöffel");
        m.insert("tablespoon", "esslöffel");
        m.insert("tablespoons", "esslöffel");
        m.insert("cup", "tasse");
        m.insert("cups", "tasse");
        m.insert("clove", "zehe");
        m.insert("cloves", "zehe");
        m.insert("bunch", "bund");
        m.insert("stick", "stiel");
        m.insert("sticks", "stiel");
        m.insert("tin", "dose");
        m.insert("tins", "dose");
        m.insert("medium", "stück");
        m.insert("large", "stück");
        m.insert("small", "stück");
        m
    };

    static ref PARENS_RE: Regex = Regex::new(r"\s*\([^)]*\)").unwrap();
    static ref MULTIPLIER_RE: Regex = Regex::new(r"(\d+)\s*x\s*(\d+)").unwrap();
    static ref AMOUNT_RE: Regex =
        Regex::new(r"^(\d+(?:[.,]\d+)?)\s*([a-zA-ZäöüÄÖÜß]+)?\s*(.*)$").unwrap();
    static ref LEADING_PUNCT_RE: Regex = Regex::new(r"^[.,;:\-/½¼¾]+\s*").unwrap();
    static ref FILLER_RE: Regex = Regex::new(
        r"\b(von|vom|der|die|das|ein|eine|einem|einer|frisch|frische|frischer|gehackt|gehackte|gehackter|gewürfelt|gewürfelte|klein|kleine|kleiner|groß|große|großer|fein|feine|feiner|grob|grobe|optional|wahlweise|etwa|ca|circa)\b"
    ).unwrap();
    static ref OF_RE: Regex = Regex::new(r"\bof\s+").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize a unit spelling to its canonical form
///
/// Unknown units pass through lowercased rather than being dropped, so
/// downstream grouping still keys on something stable.
pub fn normalize_unit(unit: &str) -> Option<String> {
    let unit_lower = unit.trim().to_lowercase();
    if unit_lower.is_empty() {
        return None;
    }
    match UNIT_MAPPING.get(unit_lower.as_str()) {
        Some(canonical) => Some((*canonical).to_string()),
        None => Some(unit_lower),
    }
}

/// Whether a lowercased token is a recognized canonical or raw unit
fn is_known_unit(token: &str) -> bool {
    UNIT_MAPPING.contains_key(token) || UNIT_MAPPING.values().any(|v| *v == token)
}

/// Parse one ingredient line into amount, unit and normalized name
///
/// # Examples
///
/// ```rust
/// use mealplanner::normalize::parse_ingredient;
///
/// let p = parse_ingredient("2 EL Olivenöl");
/// assert_eq!(p.amount, Some(2.0));
/// assert_eq!(p.unit.as_deref(), Some("esslöffel"));
/// assert_eq!(p.name, "olivenöl");
///
/// let p = parse_ingredient("Salz");
/// assert_eq!(p.amount, None);
/// assert_eq!(p.name, "salz");
/// ```
pub fn parse_ingredient(line: &str) -> ParsedIngredient {
    let original = line.trim().to_string();

    // Parenthetical notes carry no structure, drop them for parsing
    let text = PARENS_RE.replace_all(&original, "").trim().to_string();

    // "1 x 400g tin" collapses to "400g tin"
    let text = MULTIPLIER_RE.replace(&text, "$2").to_string();

    let (amount, unit, name_raw) = match AMOUNT_RE.captures(&text) {
        Some(caps) => {
            let amount: f64 = caps[1].replace(',', ".").parse().unwrap_or(0.0);
            let unit_token = caps.get(2).map(|m| m.as_str().to_lowercase());
            let rest = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");

            match unit_token {
                Some(tok) if is_known_unit(&tok) && !rest.is_empty() => {
                    (Some(amount), normalize_unit(&tok), rest.to_string())
                }
                // The token after the number is part of the name,
                // e.g. "2 Auberginen"
                Some(tok) if !rest.is_empty() => {
                    (Some(amount), None, format!("{tok} {rest}"))
                }
                Some(tok) => (Some(amount), None, tok),
                None => (Some(amount), None, rest.to_string()),
            }
        }
        None => (None, None, text),
    };

    ParsedIngredient {
        original,
        amount,
        unit,
        name: normalize_name(&name_raw),
    }
}

/// Normalize an ingredient name for matching
///
/// Lowercases, strips leading punctuation and filler words, collapses
/// whitespace and reduces basic German plurals to singular.
pub fn normalize_name(name: &str) -> String {
    let mut name = name.trim().to_lowercase();
    name = LEADING_PUNCT_RE.replace(&name, "").to_string();
    name = FILLER_RE.replace_all(&name, "").to_string();
    name = OF_RE.replace_all(&name, "").to_string();
    name = WHITESPACE_RE.replace_all(&name, " ").trim().to_string();

    // Tomaten -> Tomate, Zwiebeln -> Zwiebel
    if name.chars().count() > 4 && name.ends_with("en") {
        name.pop();
    }

    name
}

/// Character-bigram Dice similarity between two strings, in [0, 1]
///
/// Used for fuzzy matching of ingredient names against known products.
/// Strings shorter than two characters only match exactly.
pub fn bigram_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let mut left = bigrams(a);
    let right = bigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let total = left.len() + right.len();
    let mut matches = 0usize;
    for bg in &right {
        if let Some(pos) = left.iter().position(|l| l == bg) {
            left.swap_remove(pos);
            matches += 1;
        }
    }
    2.0 * matches as f64 / total as f64
}

/// Extract the sorted unique normalized names from a list of raw lines
pub fn extract_unique_names(lines: &[String]) -> Vec<String> {
    let mut names: Vec<String> = lines
        .iter()
        .map(|l| parse_ingredient(l).name)
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_unit_name() {
        let p = parse_ingredient("200 g Naturreis");
        assert_eq!(p.amount, Some(200.0));
        assert_eq!(p.unit.as_deref(), Some("gramm"));
        assert_eq!(p.name, "naturreis");
    }

    #[test]
    fn test_parse_abbreviated_unit() {
        let p = parse_ingredient("2 EL Olivenöl");
        assert_eq!(p.amount, Some(2.0));
        assert_eq!(p.unit.as_deref(), Some("esslöffel"));
        assert_eq!(p.name, "olivenöl");
    }

    #[test]
    fn test_parse_no_amount() {
        let p = parse_ingredient("Salz");
        assert_eq!(p.amount, None);
        assert_eq!(p.unit, None);
        assert_eq!(p.name, "salz");
    }

    #[test]
    fn test_parse_count_without_unit() {
        // "Auberginen" is not a unit, it belongs to the name
        let p = parse_ingredient("2 Auberginen");
        assert_eq!(p.amount, Some(2.0));
        assert_eq!(p.unit, None);
        assert_eq!(p.name, "aubergine");
    }

    #[test]
    fn test_parse_decimal_comma() {
        let p = parse_ingredient("1,5 kg Tomaten");
        assert_eq!(p.amount, Some(1.5));
        assert_eq!(p.unit.as_deref(), Some("kilogramm"));
        assert_eq!(p.name, "tomate");
    }

    #[test]
    fn test_parse_strips_parentheses() {
        let p = parse_ingredient("200 g Linsen (z. B. Puylinsen)");
        assert_eq!(p.amount, Some(200.0));
        assert_eq!(p.unit.as_deref(), Some("gramm"));
        assert_eq!(p.name, "linse");
        assert_eq!(p.original, "200 g Linsen (z. B. Puylinsen)");
    }

    #[test]
    fn test_parse_english_units() {
        let p = parse_ingredient("2 cloves of garlic");
        assert_eq!(p.amount, Some(2.0));
        assert_eq!(p.unit.as_deref(), Some("zehe"));
        assert_eq!(p.name, "garlic");

        let p = parse_ingredient("1 x 400g tin of chickpeas");
        assert_eq!(p.amount, Some(400.0));
        assert_eq!(p.unit.as_deref(), Some("gramm"));
        assert_eq!(p.name, "tin chickpeas");
    }

    #[test]
    fn test_parse_removes_filler_words() {
        let p = parse_ingredient("1 kleine Süßkartoffel (200 g)");
        assert_eq!(p.amount, Some(1.0));
        assert_eq!(p.unit, None);
        assert_eq!(p.name, "süßkartoffel");
    }

    #[test]
    fn test_normalize_plural() {
        assert_eq!(normalize_name("Tomaten"), "tomate");
        assert_eq!(normalize_name("Auberginen"), "aubergine");
        // Only the "-en" ending is reduced
        assert_eq!(normalize_name("Zwiebeln"), "zwiebeln");
        // Too short for the plural rule
        assert_eq!(normalize_name("Reis"), "reis");
    }

    #[test]
    fn test_normalize_unit_unknown_passes_through() {
        assert_eq!(normalize_unit("Packung").as_deref(), Some("packung"));
        assert_eq!(normalize_unit("  "), None);
    }

    #[test]
    fn test_bigram_similarity() {
        assert_eq!(bigram_similarity("tomate", "tomate"), 1.0);
        assert!(bigram_similarity("tomate", "tomaten") > 0.8);
        assert!(bigram_similarity("tomate", "linse") < 0.3);
        assert_eq!(bigram_similarity("a", "b"), 0.0);
    }

    #[test]
    fn test_extract_unique_names() {
        let lines = vec![
            "200 g Tomaten".to_string(),
            "2 Tomaten".to_string(),
            "Salz".to_string(),
        ];
        assert_eq!(extract_unique_names(&lines), vec!["salz", "tomate"]);
    }
}
