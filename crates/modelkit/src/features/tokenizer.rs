//! Text tokenization for bag-of-words features.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A vocabulary entry: a single word or a pair of adjacent words.
///
/// Serializes untagged: a unigram is a JSON string, a bigram a two-element
/// array.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Unigram(String),
    Bigram(String, String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Unigram(token) => write!(f, "{token}"),
            Token::Bigram(a, b) => write!(f, "{a} {b}"),
        }
    }
}

/// Splits text into runs of adjacent alphanumeric characters.
///
/// Tokens are lowercased and at least two characters long.
///
/// | text            | tokens                      |
/// |-----------------|-----------------------------|
/// | `Don't`         | `don`                       |
/// | `$50`           | `50`                        |
/// | `CEO/Co-founder`| `ceo`, `co`, `founder`      |
/// | `C.E.O`         | (none)                      |
#[derive(Debug, Clone)]
pub struct AlphanumericTokenizer<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> AlphanumericTokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }
}

impl<'a> Iterator for AlphanumericTokenizer<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        // Skip forward to the first pair of adjacent alphanumeric chars.
        loop {
            let mut chars = self.text[self.position..].chars();
            let first = chars.next()?;
            let second = chars.next()?;
            if first.is_alphanumeric() && second.is_alphanumeric() {
                break;
            }
            self.position += first.len_utf8();
        }

        let start = self.position;
        let mut has_uppercase = false;
        for c in self.text[start..].chars() {
            if !c.is_alphanumeric() {
                break;
            }
            has_uppercase |= c.is_uppercase();
            self.position += c.len_utf8();
        }

        let token = &self.text[start..self.position];
        Some(if has_uppercase {
            Cow::Owned(token.to_lowercase())
        } else {
            Cow::Borrowed(token)
        })
    }
}

/// Unigrams followed by bigrams of adjacent unigrams, in text order.
pub fn unigrams_and_bigrams(text: &str) -> impl Iterator<Item = Token> + '_ {
    let unigrams: Vec<Cow<'_, str>> = AlphanumericTokenizer::new(text).collect();
    let bigrams: Vec<Token> = unigrams
        .windows(2)
        .map(|pair| Token::Bigram(pair[0].to_string(), pair[1].to_string()))
        .collect();
    unigrams
        .into_iter()
        .map(|u| Token::Unigram(u.into_owned()))
        .chain(bigrams)
}
