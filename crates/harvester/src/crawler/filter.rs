//! Language filtering.

use crate::github::types::LanguageBreakdown;

/// What is known about a repository's languages at filter time: either
/// the single primary language from a listing record, or the full
/// per-language byte breakdown fetched on demand.
#[derive(Debug, Clone, Copy)]
pub enum LanguageHint<'a> {
    Primary(&'a str),
    Breakdown(&'a LanguageBreakdown),
}

/// Whether a repository is in one of the wanted languages.
///
/// The primary-language comparison is exact; breakdown keys compare
/// case-insensitively. No hint means the repository is not wanted.
pub fn is_language_wanted(wanted: &[String], hint: Option<LanguageHint<'_>>) -> bool {
    match hint {
        None => false,
        Some(LanguageHint::Primary(language)) => wanted.iter().any(|w| w == language),
        Some(LanguageHint::Breakdown(breakdown)) => breakdown
            .keys()
            .any(|language| wanted.iter().any(|w| w.eq_ignore_ascii_case(language))),
    }
}
