//! Match classification and ranking.
//!
//! Every candidate item lands in exactly one [`Tier`]. Inside a tier, items are
//! ordered by field (title before description), then by match quality, then by
//! load order. [`Rank`] orders lexicographically, lower is better.

use super::tokenize::Tokenized;

/// Skipped characters allowed per query character in a fuzzy match.
const FUZZY_GAP_FACTOR: usize = 2;

/// Shortest query (in characters) that may match fuzzily.
const MIN_FUZZY_LEN: usize = 2;

/// Match category, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Query is a contiguous substring of the field
    Exact,
    /// Every query word prefixes a field token, in order
    Prefix,
    /// Query characters occur in order within the gap budget
    Fuzzy,
}

/// Field a match was found in. Title outweighs description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Description,
}

/// Where an exact substring match begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Anchor {
    FieldStart,
    TokenStart,
    InsideToken,
}

/// A match within one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct FieldMatch {
    /// Anchor rank for exact matches, skipped characters for fuzzy matches
    pub(crate) closeness: u32,
    /// Offset of the first matched character
    pub(crate) start: u32,
}

/// Sort key for a matched item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank {
    pub tier: Tier,
    pub field: Field,
    pub(crate) closeness: u32,
    pub(crate) start: u32,
}

/// A query prepared once and evaluated against every field.
#[derive(Debug, Clone)]
pub(crate) struct MatchQuery {
    pub(crate) normalized: String,
    pub(crate) words: Vec<String>,
    pub(crate) fuzzy: Vec<char>,
}

impl MatchQuery {
    pub(crate) fn new(normalized: String, words: Vec<String>) -> Self {
        let fuzzy = normalized.chars().filter(|c| !c.is_whitespace()).collect();
        Self {
            normalized,
            words,
            fuzzy,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// A tokenized field with its characters cached for fuzzy scanning.
#[derive(Debug, Clone)]
pub(crate) struct IndexedField {
    pub(crate) text: Tokenized,
    chars: Vec<char>,
}

impl IndexedField {
    pub(crate) fn new(mut text: Tokenized) -> Self {
        // compound words share their start with the first sub-word; keep that order
        text.tokens.sort_by_key(|token| token.start);
        let chars = text.normalized.chars().collect();
        Self { text, chars }
    }

    fn match_tier(&self, tier: Tier, query: &MatchQuery) -> Option<FieldMatch> {
        match tier {
            Tier::Exact => self.substring_match(&query.normalized),
            Tier::Prefix => self.token_prefix_match(&query.words),
            Tier::Fuzzy => self.fuzzy_match(&query.fuzzy),
        }
    }

    /// Best occurrence of `needle`: earliest among the best-anchored ones.
    fn substring_match(&self, needle: &str) -> Option<FieldMatch> {
        let haystack = &self.text.normalized;
        if needle.is_empty() || !haystack.contains(needle) {
            return None;
        }

        haystack
            .char_indices()
            .filter(|(offset, _)| haystack[*offset..].starts_with(needle))
            .map(|(offset, _)| {
                let anchor = if offset == 0 {
                    Anchor::FieldStart
                } else if self.text.is_boundary(offset) {
                    Anchor::TokenStart
                } else {
                    Anchor::InsideToken
                };
                FieldMatch {
                    closeness: anchor as u32,
                    start: offset as u32,
                }
            })
            .min()
    }

    /// Each word must prefix a token that starts after the previous word's token.
    fn token_prefix_match(&self, words: &[String]) -> Option<FieldMatch> {
        let (first, rest) = words.split_first()?;
        let tokens = &self.text.tokens;

        let head = tokens.iter().find(|token| token.text.starts_with(first.as_str()))?;
        let mut last_start = head.start;
        for word in rest {
            let next = tokens
                .iter()
                .find(|token| token.start > last_start && token.text.starts_with(word.as_str()))?;
            last_start = next.start;
        }

        Some(FieldMatch {
            closeness: 0,
            start: head.start as u32,
        })
    }

    /// Tightest in-order occurrence of `pattern`'s characters.
    ///
    /// For each possible first character, matching greedily forward yields the
    /// earliest possible end, so the minimum over all starts is the tightest span.
    fn fuzzy_match(&self, pattern: &[char]) -> Option<FieldMatch> {
        if pattern.len() < MIN_FUZZY_LEN {
            return None;
        }
        let budget = pattern.len() * FUZZY_GAP_FACTOR;
        let chars = &self.chars;

        let mut best: Option<FieldMatch> = None;
        for start in 0..chars.len() {
            if chars[start] != pattern[0] {
                continue;
            }

            let mut matched = 1;
            let mut end = start;
            for (offset, c) in chars.iter().enumerate().skip(start + 1) {
                if matched == pattern.len() {
                    break;
                }
                if *c == pattern[matched] {
                    matched += 1;
                    end = offset;
                }
                if offset + 1 - start - matched > budget {
                    break;
                }
            }
            if matched < pattern.len() {
                continue;
            }

            let gaps = end + 1 - start - pattern.len();
            if gaps > budget {
                continue;
            }
            let candidate = FieldMatch {
                closeness: gaps as u32,
                start: start as u32,
            };
            if best.is_none_or(|current| candidate < current) {
                best = Some(candidate);
            }
        }
        best
    }
}

/// Ranks an item by its title and description, or `None` when neither matches.
pub(crate) fn rank_fields(
    title: &IndexedField,
    description: &IndexedField,
    query: &MatchQuery,
) -> Option<Rank> {
    [Tier::Exact, Tier::Prefix, Tier::Fuzzy]
        .into_iter()
        .find_map(|tier| {
            let (field, found) = title
                .match_tier(tier, query)
                .map(|found| (Field::Title, found))
                .or_else(|| {
                    description
                        .match_tier(tier, query)
                        .map(|found| (Field::Description, found))
                })?;
            Some(Rank {
                tier,
                field,
                closeness: found.closeness,
                start: found.start,
            })
        })
}
