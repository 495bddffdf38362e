use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Input validation utilities for post service

/// Maximum post length, counted in Unicode scalar values
pub const MAX_CONTENT_CHARS: usize = 280;

// Compile regex patterns once at startup
// These patterns are hardcoded and always valid, so we use expect() with explicit reasoning
static EMOJI_CONTENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    // Matches strings made up entirely of emoji: pictographs plus the
    // components that compose emoji sequences (skin tones, regional
    // indicators, keycaps). Digits also fall under Emoji_Component.
    Regex::new(r"^(\p{Extended_Pictographic}|\p{Emoji_Component})+$")
        .expect("hardcoded emoji regex is invalid - fix source code")
});

/// Validate post content: 1-280 characters, emoji only
pub fn validate_post_content(content: &str) -> Result<(), ValidationError> {
    let chars = content.chars().count();

    if chars == 0 {
        let mut err = ValidationError::new("content_empty");
        err.message = Some("Content must not be empty".into());
        return Err(err);
    }

    if chars > MAX_CONTENT_CHARS {
        let mut err = ValidationError::new("content_too_long");
        err.message = Some("Content must be at most 280 characters".into());
        return Err(err);
    }

    if !EMOJI_CONTENT_REGEX.is_match(content) {
        let mut err = ValidationError::new("content_not_emoji");
        err.message = Some("Only emojis are allowed".into());
        return Err(err);
    }

    Ok(())
}
