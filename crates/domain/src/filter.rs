use crate::error::FilterError;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// How the kept first/last characters of a masked word are cased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskCase {
    #[default]
    Lower,
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filtered {
    pub text: String,
    pub is_blurred: bool,
}

/// Immutable snapshot. `lookup` and `words` always hold the same entries.
#[derive(Debug, Default)]
struct Dictionary {
    lookup: HashSet<String>,
    words: Vec<String>,
}

impl Dictionary {
    fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Dictionary::default();
        for w in words {
            if let Some(w) = normalize_word(w.as_ref()) {
                if dict.lookup.insert(w.clone()) {
                    dict.words.push(w);
                }
            }
        }
        dict
    }
}

/// Process-wide slang dictionary plus the redaction routine.
///
/// Readers take a cheap `Arc` snapshot, so a filter call never observes a
/// dictionary that is half way through an update. Writers build a fresh
/// snapshot and swap it in under the write lock.
#[derive(Debug)]
pub struct SlangFilter {
    dictionary: RwLock<Arc<Dictionary>>,
    mask_case: MaskCase,
}

impl Default for SlangFilter {
    fn default() -> Self {
        Self::new(MaskCase::default())
    }
}

impl SlangFilter {
    pub fn new(mask_case: MaskCase) -> Self {
        Self {
            dictionary: RwLock::new(Arc::new(Dictionary::default())),
            mask_case,
        }
    }

    pub fn with_words<I, S>(words: I, mask_case: MaskCase) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dictionary: RwLock::new(Arc::new(Dictionary::from_words(words))),
            mask_case,
        }
    }

    /// Replaces the whole dictionary.
    pub fn configure<I, S>(&self, words: I) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let next = Arc::new(Dictionary::from_words(words));
        let mut guard = self.dictionary.write().map_err(|_| FilterError::Poisoned)?;
        *guard = next;
        Ok(())
    }

    /// Returns `false` if the word was already present or is not a valid word.
    pub fn add_word(&self, word: &str) -> Result<bool, FilterError> {
        let Some(word) = normalize_word(word) else {
            return Ok(false);
        };
        let mut guard = self.dictionary.write().map_err(|_| FilterError::Poisoned)?;
        if guard.lookup.contains(&word) {
            return Ok(false);
        }
        let mut words = guard.words.clone();
        words.push(word);
        *guard = Arc::new(Dictionary::from_words(words));
        Ok(true)
    }

    /// Returns `false` if the word was not in the dictionary.
    pub fn remove_word(&self, word: &str) -> Result<bool, FilterError> {
        let Some(word) = normalize_word(word) else {
            return Ok(false);
        };
        let mut guard = self.dictionary.write().map_err(|_| FilterError::Poisoned)?;
        if !guard.lookup.contains(&word) {
            return Ok(false);
        }
        let next = Dictionary::from_words(guard.words.iter().filter(|w| **w != word));
        *guard = Arc::new(next);
        Ok(true)
    }

    /// Display list, in insertion order.
    pub fn words(&self) -> Result<Vec<String>, FilterError> {
        Ok(self.snapshot()?.words.clone())
    }

    pub fn filter(&self, text: &str) -> Result<Filtered, FilterError> {
        let dict = self.snapshot()?;
        if dict.lookup.is_empty() {
            return Ok(Filtered {
                text: text.to_string(),
                is_blurred: false,
            });
        }

        let mut out = String::with_capacity(text.len());
        let mut is_blurred = false;
        for token in tokenize(text) {
            if is_word_token(token) && dict.lookup.contains(&token.to_lowercase()) {
                out.push_str(&mask(token, self.mask_case));
                is_blurred = true;
            } else {
                out.push_str(token);
            }
        }

        Ok(Filtered {
            text: out,
            is_blurred,
        })
    }

    fn snapshot(&self) -> Result<Arc<Dictionary>, FilterError> {
        let guard = self.dictionary.read().map_err(|_| FilterError::Poisoned)?;
        Ok(Arc::clone(&guard))
    }
}

/// Lower-cases and trims a dictionary entry. `None` for empty input or
/// anything that is not a single word.
pub fn normalize_word(raw: &str) -> Option<String> {
    let w = raw.trim().to_lowercase();
    if w.is_empty() || !w.chars().all(is_word_char) {
        return None;
    }
    Some(w)
}

/// One word per line; blank lines and `#` comments are skipped.
pub fn parse_word_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(normalize_word)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_token(token: &str) -> bool {
    token.chars().next().is_some_and(is_word_char)
}

/// Splits on word boundaries. Concatenating the tokens yields the input.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (idx, c) in text.char_indices() {
        let word = is_word_char(c);
        match current {
            Some(prev) if prev != word => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        current = Some(word);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn mask(token: &str, case: MaskCase) -> String {
    let chars: Vec<char> = token.chars().collect();
    let n = chars.len();
    if n <= 2 {
        return "*".repeat(n);
    }

    let keep = |c: char| -> String {
        match case {
            MaskCase::Lower => c.to_lowercase().collect(),
            MaskCase::Preserve => c.to_string(),
        }
    };

    let mut out = keep(chars[0]);
    out.push_str(&"*".repeat(n - 2));
    out.push_str(&keep(chars[n - 1]));
    out
}
