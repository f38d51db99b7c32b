use serde::Serialize;
use sqlx::FromRow;
use unicode_general_category::{get_general_category, GeneralCategory};

/// A category and how many posts carry it
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryUsage {
    pub name: String,
    pub post_count: i64,
}

/// Normalize free text into category terms.
///
/// Lowercases, turns Unicode punctuation (general category P*) into a
/// separator, splits on whitespace and drops repeats
/// while keeping first-occurrence order. Used both when tagging threads
/// and when searching, so stored names and search terms always agree.
pub fn normalize_terms(raw: &str) -> Vec<String> {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if is_punctuation(c) { ' ' } else { c })
        .collect();

    let mut terms: Vec<String> = Vec::new();
    for word in cleaned.split_whitespace() {
        if !terms.iter().any(|t| t == word) {
            terms.push(word.to_string());
        }
    }
    terms
}

/// Symbols such as `+`, `$` or `<` are not punctuation and stay in the term
fn is_punctuation(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
    )
}
