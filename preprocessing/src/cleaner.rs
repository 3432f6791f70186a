use regex::Regex;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};
use tracing::warn;

const LINK_PATTERN: &str = r"https?://[A-Za-z0-9./]+";
const HASHTAG_MARKER: char = '#';
// Markers are stripped before this runs, so the `#` in the class never matches.
const NON_LETTER_PATTERN: &str = r"[^a-zA-Z#]";

/// Normalizes the text of a single post before scoring.
///
/// Cleaning drops links, hashtag markers (the tagged word is kept), digits,
/// punctuation, emoji and any non-ASCII letters, then lower-cases and
/// re-tokenizes so that words are separated by exactly one space.
///
/// Hashtag words end up as ordinary vocabulary; they get no extra weight.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    link_regex: Regex,
    non_letter_regex: Regex,
    tokenizer: Whitespace,
}

impl TextCleaner {
    pub fn new() -> Self {
        Self {
            link_regex: Regex::new(LINK_PATTERN).expect("link pattern is valid"),
            non_letter_regex: Regex::new(NON_LETTER_PATTERN).expect("letter pattern is valid"),
            tokenizer: Whitespace::default(),
        }
    }

    /// Never fails: any input, including an empty one, yields a possibly empty string.
    pub fn clean(&self, raw: &str) -> String {
        let no_links = self.link_regex.replace_all(raw, " ");
        let no_hashtags = no_links.replace(HASHTAG_MARKER, "");
        let letters_only = self.non_letter_regex.replace_all(&no_hashtags, " ");
        let lower_case = letters_only.to_lowercase();

        self.tokenize(&lower_case).join(" ").trim().to_string()
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut pretokenized = PreTokenizedString::from(text);

        match self.tokenizer.pre_tokenize(&mut pretokenized) {
            Ok(()) => pretokenized
                .get_splits(OffsetReferential::Original, OffsetType::Byte)
                .into_iter()
                .map(|(token, _, _)| token.to_string())
                .collect(),
            Err(e) => {
                warn!("Word tokenizer failed, splitting on whitespace: {}", e);
                text.split_whitespace().map(str::to_string).collect()
            }
        }
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}
