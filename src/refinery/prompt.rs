// * Prompt refinery
// * Keyword include/exclude policy and HTML tag stripping for generation prompts

use regex::Regex;
use std::sync::LazyLock;

// * Non-greedy, single line: "<lora:x:1>" and "<b>" go, text between tags stays
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("! CRITICAL: Failed to compile tag regex"));

/// Comma separated keyword list, each keyword trimmed of surrounding whitespace.
///
/// Matching is a case-sensitive substring test against the prompt. Keywords that are
/// empty after trimming are dropped, so `"cat,,"` holds just `cat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordList {
    keywords: Vec<String>,
}

impl KeywordList {
    pub fn parse(csv: &str) -> Self {
        let keywords = csv
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        Self { keywords }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns the first keyword occurring in `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|keyword| text.contains(keyword))
    }
}

/// Why a prompt was rejected by the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An ignore keyword occurs in the prompt
    IgnoredKeyword(String),
    /// A require list is configured and none of it occurs in the prompt
    MissingRequiredKeyword,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::IgnoredKeyword(k) => write!(f, "matching ignore keyword '{}'", k),
            SkipReason::MissingRequiredKeyword => write!(f, "no required keyword present"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptDecision {
    Keep,
    Skip(SkipReason),
}

/// Include/exclude rules applied to an item's prompt. The ignore list is checked first.
#[derive(Debug, Clone, Default)]
pub struct KeywordPolicy {
    require: KeywordList,
    ignore: KeywordList,
}

impl KeywordPolicy {
    pub fn new(require: KeywordList, ignore: KeywordList) -> Self {
        Self { require, ignore }
    }

    pub fn evaluate(&self, prompt: &str) -> PromptDecision {
        if let Some(keyword) = self.ignore.first_match(prompt) {
            return PromptDecision::Skip(SkipReason::IgnoredKeyword(keyword.to_string()));
        }

        if !self.require.is_empty() && self.require.first_match(prompt).is_none() {
            return PromptDecision::Skip(SkipReason::MissingRequiredKeyword);
        }

        PromptDecision::Keep
    }
}

/// Removes every `<...>` tag from the prompt text.
pub fn strip_tags(prompt: &str) -> String {
    TAG_PATTERN.replace_all(prompt, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_list_trims_and_drops_blanks() {
        let list = KeywordList::parse(" cat , dog,, ");
        assert_eq!(list.keywords(), &["cat".to_string(), "dog".to_string()]);
        assert!(KeywordList::parse("").is_empty());
        assert!(KeywordList::parse(" , ").is_empty());
    }

    #[test]
    fn test_ignore_is_substring_match() {
        let policy = KeywordPolicy::new(KeywordList::default(), KeywordList::parse("cat, dog"));

        assert_eq!(
            policy.evaluate("a dog ran"),
            PromptDecision::Skip(SkipReason::IgnoredKeyword("dog".into()))
        );
        // * "doge" contains "dog" as a substring
        assert!(matches!(policy.evaluate("much doge"), PromptDecision::Skip(_)));
        assert_eq!(policy.evaluate("a bird flew"), PromptDecision::Keep);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let policy = KeywordPolicy::new(KeywordList::default(), KeywordList::parse("Dog"));
        assert_eq!(policy.evaluate("a dog ran"), PromptDecision::Keep);
    }

    #[test]
    fn test_require_list() {
        let policy = KeywordPolicy::new(KeywordList::parse("castle,forest"), KeywordList::default());

        assert_eq!(policy.evaluate("dark forest at night"), PromptDecision::Keep);
        assert_eq!(
            policy.evaluate("portrait of a knight"),
            PromptDecision::Skip(SkipReason::MissingRequiredKeyword)
        );
    }

    #[test]
    fn test_ignore_wins_over_require() {
        let policy = KeywordPolicy::new(KeywordList::parse("forest"), KeywordList::parse("night"));
        assert_eq!(
            policy.evaluate("dark forest at night"),
            PromptDecision::Skip(SkipReason::IgnoredKeyword("night".into()))
        );
    }

    #[test]
    fn test_empty_policy_keeps_everything() {
        let policy = KeywordPolicy::default();
        assert_eq!(policy.evaluate(""), PromptDecision::Keep);
        assert_eq!(policy.evaluate("anything"), PromptDecision::Keep);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("masterpiece, <lora:detail:0.8> castle <b>bold</b>"),
            "masterpiece,  castle bold"
        );
        assert_eq!(strip_tags("no tags here"), "no tags here");
        // * Unclosed bracket is left alone
        assert_eq!(strip_tags("a < b"), "a < b");
    }
}
