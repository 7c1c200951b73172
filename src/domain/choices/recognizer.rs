//! Matches user input against a list of choices.
//!
//! Text matching is token based: every value, action title and synonym is
//! tokenized and searched for in order within the utterance, allowing a few
//! skipped tokens between matched ones. When no text matches, ordinal words
//! ("second", "last") and 1-based indices select a choice by position.

use super::choice::{Choice, FoundChoice, ModelResult};

/// A run of word characters, or a single CJK character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset of the last character.
    pub end: usize,
    pub text: String,
    /// Lowercased `text`.
    pub normalized: String,
}

/// Knobs for [`find_choices`] and [`recognize_choices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindChoicesOptions {
    /// Don't search choice values.
    pub no_value: bool,
    /// Don't search choice action titles.
    pub no_action: bool,
    /// Accept values whose tokens were only partly found.
    pub allow_partial_matches: bool,
    /// Most tokens that may be skipped between two matched tokens.
    pub max_token_distance: usize,
    pub recognize_ordinals: bool,
    pub recognize_numbers: bool,
}

impl Default for FindChoicesOptions {
    fn default() -> Self {
        Self {
            no_value: false,
            no_action: false,
            allow_partial_matches: false,
            max_token_distance: 2,
            recognize_ordinals: true,
            recognize_numbers: true,
        }
    }
}

const ORDINALS: [(&str, &str); 10] = [
    ("first", "1st"),
    ("second", "2nd"),
    ("third", "3rd"),
    ("fourth", "4th"),
    ("fifth", "5th"),
    ("sixth", "6th"),
    ("seventh", "7th"),
    ("eighth", "8th"),
    ("ninth", "9th"),
    ("tenth", "10th"),
];

/// Splits text on whitespace and punctuation. CJK characters become tokens
/// of their own.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;

    for (i, c) in text.chars().enumerate() {
        if is_cjk(c) {
            tokens.extend(current.take());
            tokens.push(token_at(i, c));
        } else if c.is_alphanumeric() {
            match current.as_mut() {
                Some(token) => {
                    token.end = i;
                    token.text.push(c);
                    token.normalized.extend(c.to_lowercase());
                }
                None => current = Some(token_at(i, c)),
            }
        } else {
            tokens.extend(current.take());
        }
    }
    tokens.extend(current);
    tokens
}

fn token_at(i: usize, c: char) -> Token {
    Token {
        start: i,
        end: i,
        text: c.to_string(),
        normalized: c.to_lowercase().collect(),
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF   // hiragana, katakana
        | 0x3400..=0x4DBF // CJK extension A
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xAC00..=0xD7AF // hangul syllables
        | 0xF900..=0xFAFF)
}

/// One searchable string and the choice it belongs to.
struct SortedValue<'a> {
    value: &'a str,
    index: usize,
}

/// A token-level match before translation to character offsets.
struct ValueMatch<'a> {
    start: usize,
    end: usize,
    value: &'a str,
    index: usize,
    score: f32,
}

/// Finds every choice mentioned in `utterance`.
///
/// Results are ordered best first: higher score, then longer match, then
/// earlier position.
pub fn find_choices(
    utterance: &str,
    choices: &[Choice],
    options: &FindChoicesOptions,
) -> Vec<ModelResult<FoundChoice>> {
    let mut values = Vec::new();
    for (index, choice) in choices.iter().enumerate() {
        if !options.no_value {
            values.push(SortedValue {
                value: &choice.value,
                index,
            });
        }
        if let Some(title) = choice.action_title.as_deref() {
            if !options.no_action {
                values.push(SortedValue { value: title, index });
            }
        }
        for synonym in &choice.synonyms {
            values.push(SortedValue {
                value: synonym,
                index,
            });
        }
    }

    let to_result = |start: usize, end: usize, text: String, index: usize, score: f32, value: &str| {
        ModelResult {
            start,
            end,
            text,
            resolution: FoundChoice {
                value: choices[index].value.clone(),
                index,
                score,
                synonym: Some(value.to_string()),
            },
        }
    };

    let trimmed = utterance.trim();
    if let Some(exact) = values.iter().find(|v| v.value.trim().to_lowercase() == trimmed.to_lowercase()) {
        let len = utterance.chars().count();
        return vec![to_result(
            0,
            len.saturating_sub(1),
            utterance.to_string(),
            exact.index,
            1.0,
            exact.value,
        )];
    }

    // Longest values are searched first so they claim tokens before their
    // substrings do.
    values.sort_by(|a, b| b.value.chars().count().cmp(&a.value.chars().count()));

    let tokens = tokenize(utterance);
    let mut matches = Vec::new();
    for entry in &values {
        let searched = tokenize(entry.value.trim());
        if searched.is_empty() {
            continue;
        }
        let mut start_pos = 0;
        while start_pos < tokens.len() {
            match match_value(&tokens, &searched, entry, start_pos, options) {
                Some(found) => {
                    start_pos = found.end + 1;
                    matches.push(found);
                }
                None => break,
            }
        }
    }

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut found_indexes = Vec::new();
    let mut used_tokens = vec![false; tokens.len()];
    let mut results = Vec::new();
    for m in matches {
        if found_indexes.contains(&m.index) || used_tokens[m.start..=m.end].iter().any(|&u| u) {
            continue;
        }
        found_indexes.push(m.index);
        used_tokens[m.start..=m.end].iter_mut().for_each(|u| *u = true);

        let start = tokens[m.start].start;
        let end = tokens[m.end].end;
        let text: String = utterance.chars().skip(start).take(end + 1 - start).collect();
        results.push(to_result(start, end, text, m.index, m.score, m.value));
    }

    results.sort_by(|a, b| {
        b.resolution
            .score
            .total_cmp(&a.resolution.score)
            .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
            .then_with(|| a.start.cmp(&b.start))
    });
    results
}

fn match_value<'a>(
    tokens: &[Token],
    searched: &[Token],
    entry: &SortedValue<'a>,
    mut start_pos: usize,
    options: &FindChoicesOptions,
) -> Option<ValueMatch<'a>> {
    let mut matched = 0usize;
    let mut total_deviation = 0usize;
    let mut span: Option<(usize, usize)> = None;

    for token in searched {
        let Some(pos) = (start_pos..tokens.len()).find(|&i| tokens[i].normalized == token.normalized)
        else {
            continue;
        };
        let distance = if matched > 0 { pos - start_pos } else { 0 };
        if distance <= options.max_token_distance {
            matched += 1;
            total_deviation += distance;
            start_pos = pos + 1;
            span = Some(span.map_or((pos, pos), |(start, _)| (start, pos)));
        }
    }

    let (start, end) = span?;
    if matched < searched.len() && !options.allow_partial_matches {
        return None;
    }

    let completeness = matched as f32 / searched.len() as f32;
    let accuracy = matched as f32 / (matched + total_deviation) as f32;
    Some(ValueMatch {
        start,
        end,
        value: entry.value,
        index: entry.index,
        score: completeness * accuracy,
    })
}

/// Recognizes a choice by text, falling back to ordinals and indices.
///
/// The first result is the best match.
pub fn recognize_choices(
    utterance: &str,
    choices: &[Choice],
    options: &FindChoicesOptions,
) -> Vec<ModelResult<FoundChoice>> {
    let found = find_choices(utterance, choices, options);
    if !found.is_empty() || choices.is_empty() {
        return found;
    }

    for token in tokenize(utterance) {
        let index = options
            .recognize_ordinals
            .then(|| ordinal_index(&token.normalized, choices.len()))
            .flatten()
            .or_else(|| {
                options
                    .recognize_numbers
                    .then(|| token.normalized.parse::<usize>().ok())
                    .flatten()
                    .filter(|n| (1..=choices.len()).contains(n))
                    .map(|n| n - 1)
            });

        if let Some(index) = index {
            return vec![ModelResult {
                start: token.start,
                end: token.end,
                text: token.text,
                resolution: FoundChoice {
                    value: choices[index].value.clone(),
                    index,
                    score: 1.0,
                    synonym: None,
                },
            }];
        }
    }
    Vec::new()
}

fn ordinal_index(word: &str, count: usize) -> Option<usize> {
    if word == "last" {
        return count.checked_sub(1);
    }
    ORDINALS
        .iter()
        .position(|(name, short)| *name == word || *short == word)
        .filter(|&i| i < count)
}
