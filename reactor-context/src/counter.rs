//! Token count estimation, CJK-density aware.

use reactor_turn::types::{ContentPart, ProviderMessage};

/// Estimates token counts from text using per-script chars-per-token ratios.
///
/// This is a heuristic estimator — real tokenization varies per model. Latin
/// script defaults to 4.0 chars/token (approximating GPT-family and Claude
/// tokenizers). CJK scripts (Han ideographs, Hiragana, Katakana, Hangul
/// syllables) default to 1.0 chars/token: those characters carry far more
/// information per Unicode scalar, and most production tokenizers spend
/// close to one token per character on them.
pub struct TokenCounter {
    chars_per_token: f32,
    cjk_chars_per_token: f32,
}

impl TokenCounter {
    /// Creates a new `TokenCounter` with the default ratios (4.0 Latin,
    /// 1.0 CJK).
    #[must_use]
    pub fn new() -> Self {
        Self {
            chars_per_token: 4.0,
            cjk_chars_per_token: 1.0,
        }
    }

    /// Creates a new `TokenCounter` with custom Latin/CJK chars-per-token
    /// ratios.
    #[must_use]
    pub fn with_ratios(chars_per_token: f32, cjk_chars_per_token: f32) -> Self {
        Self {
            chars_per_token,
            cjk_chars_per_token,
        }
    }

    /// Estimates the number of tokens in a text string, splitting CJK and
    /// non-CJK characters and estimating each span with its own ratio.
    pub fn estimate_text(&self, text: &str) -> usize {
        let (cjk_chars, other_chars) = text
            .chars()
            .fold((0usize, 0usize), |(cjk, other), c| {
                if is_cjk(c) {
                    (cjk + 1, other)
                } else {
                    (cjk, other + 1)
                }
            });

        let cjk_tokens = (cjk_chars as f32 / self.cjk_chars_per_token).ceil() as usize;
        let other_tokens = (other_chars as f32 / self.chars_per_token).ceil() as usize;
        cjk_tokens + other_tokens
    }

    /// Estimates the token count for a single provider message, including a
    /// small fixed overhead for role/formatting.
    pub fn estimate_message(&self, message: &ProviderMessage) -> usize {
        let role_overhead = 4;
        let content_tokens: usize = message
            .content
            .iter()
            .map(|part| self.estimate_part(part))
            .sum();
        role_overhead + content_tokens
    }

    /// Estimates the total token count for a slice of provider messages.
    pub fn estimate_messages(&self, messages: &[ProviderMessage]) -> usize {
        messages.iter().map(|m| self.estimate_message(m)).sum()
    }

    fn estimate_part(&self, part: &ContentPart) -> usize {
        match part {
            ContentPart::Text { text } => self.estimate_text(text),
            ContentPart::ToolUse { name, input, .. } => {
                self.estimate_text(name) + self.estimate_text(&input.to_string())
            }
            ContentPart::ToolResult { content, .. } => self.estimate_text(content),
            // Images are expensive and opaque to this estimator; use a fixed
            // approximation consistent across providers.
            ContentPart::Image { .. } => 300,
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `c` belongs to a CJK script (Han, Hiragana, Katakana, Hangul).
fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF   // Hiragana + Katakana
        | 0x3400..=0x4DBF // CJK Unified Ideographs Extension A
        | 0x4E00..=0x9FFF // CJK Unified Ideographs
        | 0xAC00..=0xD7A3 // Hangul syllables
        | 0xF900..=0xFAFF // CJK Compatibility Ideographs
    )
}
