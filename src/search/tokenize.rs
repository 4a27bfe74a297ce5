//! Text normalization and tokenization for item titles and descriptions.

/// A sub-word or compound word extracted from a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    /// Lower-cased token text
    pub(crate) text: String,
    /// Byte offset of the token within the normalized field
    pub(crate) start: usize,
}

/// A normalized field together with its token boundaries.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tokenized {
    /// Lower-cased field text, same characters as the source
    pub(crate) normalized: String,
    /// Byte offsets in `normalized` where a word or CamelCase sub-word starts
    pub(crate) boundaries: Vec<usize>,
    pub(crate) tokens: Vec<Token>,
}

impl Tokenized {
    /// Whether `offset` starts a word or sub-word.
    pub(crate) fn is_boundary(&self, offset: usize) -> bool {
        self.boundaries.binary_search(&offset).is_ok()
    }
}

/// Normalizes a query: trimmed and lower-cased one character at a time, the
/// same way [`tokenize`] lowers fields (no context-sensitive final sigma).
pub(crate) fn normalize_query(text: &str) -> String {
    text.trim().chars().flat_map(char::to_lowercase).collect()
}

/// Splits a normalized query into words on non-alphanumeric characters.
pub(crate) fn query_words(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Tokenizes a field into searchable terms with case-aware splitting.
///
/// Words are separated by any non-alphanumeric character (path separators, dots,
/// dashes, underscores, whitespace). Inside a word, a lowercase → uppercase
/// transition starts a new sub-word:
/// - "PosthogPageView.ts" → ["posthog", "page", "view", "posthogpageview", "ts"]
/// - "llm-info/package.json" → ["llm", "info", "package", "json"]
///
/// Both the sub-words and the complete compound word are emitted so a query can
/// prefix-match either.
pub(crate) fn tokenize(text: &str) -> Tokenized {
    let mut normalized = String::with_capacity(text.len());
    let mut boundaries = Vec::new();
    let mut tokens = Vec::new();

    let mut word_start: Option<usize> = None;
    let mut subword_start = 0;
    let mut last_lower = false;

    for c in text.chars() {
        let offset = normalized.len();

        if c.is_alphanumeric() {
            match word_start {
                None => {
                    word_start = Some(offset);
                    subword_start = offset;
                    boundaries.push(offset);
                }
                // CamelCase boundary: "posthog" → "P" in "PosthogPage"
                Some(_) if last_lower && c.is_uppercase() => {
                    push_token(&normalized, subword_start, offset, &mut tokens);
                    subword_start = offset;
                    boundaries.push(offset);
                }
                Some(_) => {}
            }
            last_lower = c.is_lowercase();
        } else {
            if let Some(start) = word_start.take() {
                finish_word(&normalized, start, subword_start, offset, &mut tokens);
            }
            last_lower = false;
        }

        normalized.extend(c.to_lowercase());
    }

    if let Some(start) = word_start {
        finish_word(
            &normalized,
            start,
            subword_start,
            normalized.len(),
            &mut tokens,
        );
    }

    Tokenized {
        normalized,
        boundaries,
        tokens,
    }
}

/// Emits the trailing sub-word (when the word had several) and the complete word.
fn finish_word(
    normalized: &str,
    word_start: usize,
    subword_start: usize,
    end: usize,
    tokens: &mut Vec<Token>,
) {
    if subword_start != word_start {
        push_token(normalized, subword_start, end, tokens);
    }
    push_token(normalized, word_start, end, tokens);
}

fn push_token(normalized: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    if end > start {
        tokens.push(Token {
            text: normalized[start..end].to_string(),
            start,
        });
    }
}
