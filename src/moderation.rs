//! Profanity masking for chirp bodies.

const MASK: &str = "****";
const BANNED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// Replace banned whole words with `****`.
///
/// Words are whitespace-separated tokens compared case-insensitively; a word
/// with trailing punctuation is a different token and is left alone. The
/// result is rejoined with single spaces.
pub fn censor(body: &str) -> String {
    body.split_whitespace()
        .map(|word| {
            let lowered = word.to_lowercase();
            if BANNED_WORDS.contains(&lowered.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_banned_word() {
        assert_eq!(
            censor("This is a kerfuffle opinion I have"),
            "This is a **** opinion I have"
        );
    }

    #[test]
    fn masking_ignores_case() {
        assert_eq!(
            censor("I really need a Sharbert and a FORNAX"),
            "I really need a **** and a ****"
        );
    }

    #[test]
    fn only_whole_tokens_are_masked() {
        assert_eq!(censor("kerfuffles everywhere"), "kerfuffles everywhere");
        assert_eq!(censor("I hear Mastodon is better than Chirpy. sharbert!"), "I hear Mastodon is better than Chirpy. sharbert!");
    }

    #[test]
    fn clean_text_passes_through() {
        let body = "I had something interesting for breakfast";
        assert_eq!(censor(body), body);
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(censor("  spaced   out\tfornax \n"), "spaced out ****");
    }
}
