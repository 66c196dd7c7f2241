//! 初回起動時の言語選択ロジック

use crate::types::{
    DEFAULT_LANGUAGE,
    Language,
};

/// Picks the UI language.
///
/// Priority: a persisted selection (kept even when the project no longer has it), then the
/// system language matched case-insensitively, then the base language, then `"en"`.
#[must_use]
pub fn choose_language(
    persisted: Option<&str>,
    system: Option<&str>,
    languages: &[Language],
) -> String {
    if let Some(persisted) = persisted.filter(|tag| !tag.trim().is_empty()) {
        return persisted.to_string();
    }

    if let Some(system) = system
        && let Some(language) = languages.iter().find(|l| l.tag.eq_ignore_ascii_case(system))
    {
        return language.tag.clone();
    }

    languages
        .iter()
        .find(|l| l.is_base)
        .map_or_else(|| DEFAULT_LANGUAGE.to_string(), |l| l.tag.clone())
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::test_utils::language;

    fn project() -> Vec<Language> {
        vec![language(1, "en", true), language(2, "cs", false)]
    }

    #[rstest]
    #[case::system_match(None, Some("cs"), "cs")]
    #[case::system_case_insensitive(None, Some("CS"), "cs")]
    #[case::unknown_system_uses_base(None, Some("de"), "en")]
    #[case::no_system_uses_base(None, None, "en")]
    #[case::persisted_wins(Some("fr"), Some("cs"), "fr")]
    #[case::blank_persisted_ignored(Some(""), Some("cs"), "cs")]
    fn chooses_by_priority(
        #[case] persisted: Option<&str>,
        #[case] system: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_that!(choose_language(persisted, system, &project()), eq(expected));
    }

    #[rstest]
    fn without_base_falls_back_to_default() {
        let languages = vec![language(2, "cs", false), language(3, "de", false)];

        assert_that!(choose_language(None, Some("pl"), &languages), eq("en"));
    }

    #[rstest]
    fn empty_project_falls_back_to_default() {
        assert_that!(choose_language(None, Some("cs"), &[]), eq("en"));
    }
}
