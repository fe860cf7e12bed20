//! Mention-token extraction from raw message text.

use regex::Regex;

use crate::base::types::Res;

/// Matches a mention token (`<@...`) at the start of the text or preceded by
/// whitespace, up to the next comma or space boundary.  A preceding
/// whitespace character is consumed along with the token.
const MENTION_PATTERN: &str = r"\s<@[^, ]*|^<@[^, ]*";

/// Strips mention tokens from message text.
///
/// Owns its compiled pattern; construct once and reuse.  The removal leaves
/// any surrounding whitespace as-is, so `"<@U123> what is Rust"` becomes
/// `" what is Rust"`.
pub struct MentionStripper {
    pattern: Regex,
}

impl MentionStripper {
    /// Create a stripper with the default mention pattern.
    pub fn new() -> Self {
        Self::with_pattern(MENTION_PATTERN).expect("default mention pattern compiles")
    }

    /// Create a stripper with an alternate pattern.
    pub fn with_pattern(pattern: &str) -> Res<Self> {
        Ok(Self { pattern: Regex::new(pattern)? })
    }

    /// Remove every mention token from `text`.
    ///
    /// Text without a mention passes through unchanged.
    pub fn strip(&self, text: &str) -> String {
        self.pattern.replace_all(text, "").into_owned()
    }
}

impl Default for MentionStripper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_leading_mention() {
        let stripper = MentionStripper::new();

        assert_eq!(stripper.strip("<@U123> what is Rust"), " what is Rust");
    }

    #[test]
    fn strips_an_embedded_mention_with_its_preceding_whitespace() {
        let stripper = MentionStripper::new();

        assert_eq!(stripper.strip("hey <@U123> how are you"), "hey how are you");
    }

    #[test]
    fn stops_at_a_comma_boundary() {
        let stripper = MentionStripper::new();

        assert_eq!(stripper.strip("<@U123>, hello"), ", hello");
    }

    #[test]
    fn strips_every_mention_in_the_text() {
        let stripper = MentionStripper::new();

        assert_eq!(stripper.strip("<@U123> ping <@U456> pong"), " ping pong");
    }

    #[test]
    fn leaves_text_without_a_mention_unchanged() {
        let stripper = MentionStripper::new();

        assert_eq!(stripper.strip("what is Rust"), "what is Rust");
    }

    #[test]
    fn stripping_is_idempotent() {
        let stripper = MentionStripper::new();

        let once = stripper.strip("<@U123> what is Rust");
        let twice = stripper.strip(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn ignores_a_sigil_in_the_middle_of_a_word() {
        let stripper = MentionStripper::new();

        assert_eq!(stripper.strip("mail me at foo<@bar"), "mail me at foo<@bar");
    }

    #[test]
    fn alternate_patterns_are_supported() {
        let stripper = MentionStripper::with_pattern(r"!\w+").unwrap();

        assert_eq!(stripper.strip("!bot hello"), " hello");
    }
}
