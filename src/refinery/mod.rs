// * The Refinery
// * Turns raw generation prompts into the text saved next to each payload

pub mod prompt;

pub use prompt::{strip_tags, KeywordList, KeywordPolicy, PromptDecision, SkipReason};
