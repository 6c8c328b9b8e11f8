use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, ThenThanError};

/// The pair of easily confused words.
///
/// The discriminant is the class label used by the classifier.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum TargetWord {
    /// "then"
    Then = 0,

    /// "than"
    Than = 1,
}

impl TargetWord {
    /// Both target words in label order.
    pub const ALL: [Self; 2] = [Self::Then, Self::Than];

    /// Gets the surface string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Then => "then",
            Self::Than => "than",
        }
    }

    /// Gets the word this one is commonly confused with.
    ///
    /// # Examples
    ///
    /// ```
    /// use thenthan::TargetWord;
    ///
    /// assert_eq!(TargetWord::Than, TargetWord::Then.other());
    /// ```
    pub const fn other(self) -> Self {
        match self {
            Self::Then => Self::Than,
            Self::Than => Self::Then,
        }
    }

    /// Gets the class label.
    pub const fn label(self) -> usize {
        self as usize
    }

    /// Gets the target word for a class label.
    pub const fn from_label(label: usize) -> Option<Self> {
        match label {
            0 => Some(Self::Then),
            1 => Some(Self::Than),
            _ => None,
        }
    }

    /// Returns the position of the first token that is exactly this word.
    ///
    /// The comparison is case-sensitive: `Then` at the beginning of a sentence does not
    /// match.
    pub fn find<S>(self, tokens: &[S]) -> Option<usize>
    where
        S: AsRef<str>,
    {
        tokens.iter().position(|t| t.as_ref() == self.as_str())
    }
}

impl fmt::Display for TargetWord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetWord {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "then" => Ok(Self::Then),
            "than" => Ok(Self::Than),
            _ => Err("Target word must be `then` or `than`."),
        }
    }
}

/// A word with its part-of-speech tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub(crate) word: String,
    pub(crate) tag: String,
}

impl TaggedToken {
    /// Creates a new tagged token.
    pub fn new<W, T>(word: W, tag: T) -> Self
    where
        W: Into<String>,
        T: Into<String>,
    {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }

    /// Gets the word.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Gets the tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Sentence with part-of-speech annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSentence {
    pub(crate) tokens: Vec<TaggedToken>,
}

impl TaggedSentence {
    /// Creates a new [`TaggedSentence`] from `(word, tag)` pairs.
    ///
    /// # Errors
    ///
    /// If `pairs` is empty or a word or tag is empty, an error variant will be returned.
    pub fn from_pairs<I, W, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (W, T)>,
        W: Into<String>,
        T: Into<String>,
    {
        let tokens: Vec<TaggedToken> = pairs
            .into_iter()
            .map(|(w, t)| TaggedToken::new(w, t))
            .collect();
        if tokens.is_empty() {
            return Err(ThenThanError::invalid_format("`pairs` is empty"));
        }
        for token in &tokens {
            if token.word.is_empty() || token.tag.is_empty() {
                return Err(ThenThanError::invalid_format(format!(
                    "empty word or tag: {:?}/{:?}",
                    token.word, token.tag
                )));
            }
        }
        Ok(Self { tokens })
    }

    /// Creates a new [`TaggedSentence`] from a tagged string.
    ///
    /// # Arguments
    ///
    /// * `tagged_text` - Whitespace-separated tokens, each written as `word/TAG`. A token is
    ///   split at its last slash, so words may contain slashes.
    ///
    /// # Returns
    ///
    /// A new [`TaggedSentence`].
    ///
    /// # Errors
    ///
    /// This function will return an error variant when:
    ///
    /// * `tagged_text` contains no tokens.
    /// * A token has no slash.
    /// * A token has an empty word or an empty tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use thenthan::TaggedSentence;
    ///
    /// let s = TaggedSentence::from_tagged("bigger/JJR than/IN that/DT").unwrap();
    /// assert_eq!(vec!["JJR", "IN", "DT"], s.tags());
    ///
    /// assert!(TaggedSentence::from_tagged("bigger than/IN").is_err());
    /// ```
    pub fn from_tagged(tagged_text: &str) -> Result<Self> {
        let mut tokens = vec![];
        for item in tagged_text.split_whitespace() {
            let (word, tag) = item.rsplit_once('/').ok_or_else(|| {
                ThenThanError::invalid_format(format!("token without a tag: {:?}", item))
            })?;
            if word.is_empty() || tag.is_empty() {
                return Err(ThenThanError::invalid_format(format!(
                    "empty word or tag: {:?}",
                    item
                )));
            }
            tokens.push(TaggedToken::new(word, tag));
        }
        if tokens.is_empty() {
            return Err(ThenThanError::invalid_format("`tagged_text` is empty"));
        }
        Ok(Self { tokens })
    }

    /// Gets the tokens.
    pub fn tokens(&self) -> &[TaggedToken] {
        &self.tokens
    }

    /// Gets the words.
    pub fn words(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.word.as_str()).collect()
    }

    /// Gets the tags.
    pub fn tags(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.tag.as_str()).collect()
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the sentence has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Generates the tagged string, the inverse of [`TaggedSentence::from_tagged()`].
    pub fn to_tagged_string(&self) -> String {
        let mut result = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i != 0 {
                result.push(' ');
            }
            result.push_str(&token.word);
            result.push('/');
            result.push_str(&token.tag);
        }
        result
    }

    /// Returns the position of the first token that is exactly `word`.
    pub fn find(&self, word: TargetWord) -> Option<usize> {
        self.tokens.iter().position(|t| t.word == word.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_word_from_str() {
        assert_eq!(Ok(TargetWord::Then), "then".parse());
        assert_eq!(Ok(TargetWord::Than), "than".parse());
        assert!("Then".parse::<TargetWord>().is_err());
    }

    #[test]
    fn test_target_word_labels() {
        assert_eq!(0, TargetWord::Then.label());
        assert_eq!(1, TargetWord::Than.label());
        assert_eq!(Some(TargetWord::Than), TargetWord::from_label(1));
        assert_eq!(None, TargetWord::from_label(2));
    }

    #[test]
    fn test_target_word_find_is_exact() {
        let tokens = ["Then", "he", "left", "then", "than"];

        assert_eq!(Some(3), TargetWord::Then.find(&tokens));
        assert_eq!(Some(4), TargetWord::Than.find(&tokens));
        assert_eq!(None, TargetWord::Then.find(&["THEN", "thence"]));
    }

    #[test]
    fn test_sentence_from_tagged() {
        let s = TaggedSentence::from_tagged("and/CC then/RB we/PPSS left/VBD").unwrap();

        let expected = TaggedSentence {
            tokens: vec![
                TaggedToken::new("and", "CC"),
                TaggedToken::new("then", "RB"),
                TaggedToken::new("we", "PPSS"),
                TaggedToken::new("left", "VBD"),
            ],
        };
        assert_eq!(expected, s);
    }

    #[test]
    fn test_sentence_from_tagged_splits_at_last_slash() {
        let s = TaggedSentence::from_tagged("1/2/CD  cup/NN").unwrap();

        assert_eq!(vec!["1/2", "cup"], s.words());
        assert_eq!(vec!["CD", "NN"], s.tags());
    }

    #[test]
    fn test_sentence_from_tagged_empty() {
        let s = TaggedSentence::from_tagged("  ");

        assert!(s.is_err());
        assert_eq!(
            "InvalidFormatError: `tagged_text` is empty",
            &s.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_sentence_from_tagged_without_tag() {
        let s = TaggedSentence::from_tagged("bigger/JJR than");

        assert!(s.is_err());
        assert_eq!(
            "InvalidFormatError: token without a tag: \"than\"",
            &s.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_sentence_from_tagged_empty_tag() {
        let s = TaggedSentence::from_tagged("bigger/ than/IN");

        assert!(s.is_err());
        assert_eq!(
            "InvalidFormatError: empty word or tag: \"bigger/\"",
            &s.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_sentence_from_pairs() {
        let s = TaggedSentence::from_pairs([("bigger", "JJR"), ("than", "IN")]).unwrap();

        assert_eq!("bigger/JJR than/IN", s.to_tagged_string());
        assert_eq!(Some(1), s.find(TargetWord::Than));
        assert_eq!(None, s.find(TargetWord::Then));
    }

    #[test]
    fn test_sentence_from_pairs_empty() {
        let pairs: Vec<(String, String)> = vec![];

        assert!(TaggedSentence::from_pairs(pairs).is_err());
    }
}
