//! Cardinal plural category selection.
//!
//! Covers the common language families by their integer rules. Languages
//! without a rule use the English one/other split.

use lingua_types::PluralCategory;

/// Selects the plural category of `count` for `language` (`de_de`, `pt-BR`, ...).
#[must_use]
pub fn category_for(language: &str, count: u64) -> PluralCategory {
    let base = base_language(language);
    match base.as_str() {
        "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "tr" => PluralCategory::Other,
        "fr" | "pt" => {
            if count <= 1 {
                PluralCategory::One
            } else {
                PluralCategory::Other
            }
        }
        "ru" | "uk" | "be" | "sr" | "hr" | "bs" => east_slavic(count),
        "pl" => polish(count),
        "cs" | "sk" => {
            if count == 1 {
                PluralCategory::One
            } else if (2..=4).contains(&count) {
                PluralCategory::Few
            } else {
                PluralCategory::Other
            }
        }
        "ar" => arabic(count),
        _ => {
            if count == 1 {
                PluralCategory::One
            } else {
                PluralCategory::Other
            }
        }
    }
}

fn base_language(language: &str) -> String {
    language
        .split(['_', '-'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn east_slavic(n: u64) -> PluralCategory {
    let (m10, m100) = (n % 10, n % 100);
    if m10 == 1 && m100 != 11 {
        PluralCategory::One
    } else if (2..=4).contains(&m10) && !(12..=14).contains(&m100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

fn polish(n: u64) -> PluralCategory {
    let (m10, m100) = (n % 10, n % 100);
    if n == 1 {
        PluralCategory::One
    } else if (2..=4).contains(&m10) && !(12..=14).contains(&m100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

fn arabic(n: u64) -> PluralCategory {
    let m100 = n % 100;
    match n {
        0 => PluralCategory::Zero,
        1 => PluralCategory::One,
        2 => PluralCategory::Two,
        _ if (3..=10).contains(&m100) => PluralCategory::Few,
        _ if (11..=99).contains(&m100) => PluralCategory::Many,
        _ => PluralCategory::Other,
    }
}
