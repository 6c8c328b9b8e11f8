//! Tokenizer and part-of-speech tagger capabilities.

use std::io::{Read, Write};

use bincode::{Decode, Encode};
use hashbrown::HashMap;
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::{Result, ThenThanError};
use crate::sentence::TaggedSentence;

/// Magic number written at the head of a tagger file.
const TAGGER_MAGIC: &[u8; 8] = b"THTAGGER";

/// Upper bound on the bytes a tagger file may decode to.
const TAGGER_SIZE_LIMIT: usize = 1 << 30;

/// Splits raw text into word tokens.
pub trait Tokenizer {
    /// Tokenizes `text`.
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Assigns a part-of-speech tag to every token.
pub trait Tagger {
    /// Returns one tag per token, in order.
    fn tag(&self, tokens: &[&str]) -> Vec<String>;
}

/// Tokenizer based on Unicode word boundaries.
///
/// Punctuation becomes separate tokens and whitespace is dropped.
///
/// # Examples
///
/// ```
/// use thenthan::{Tokenizer, WordTokenizer};
///
/// let toks = WordTokenizer.tokenize("Bigger than that, then.");
/// assert_eq!(vec!["Bigger", "than", "that", ",", "then", "."], toks);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_word_bounds()
            .filter(|w| !w.trim().is_empty())
            .collect()
    }
}

/// Rule-based tagger that guesses a tag from the shape of a word.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixTagger;

fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    let int_len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if int_len == 0 {
        return false;
    }
    let mut rest = digits[int_len..].chars();
    match rest.next() {
        None => true,
        // Any single separator followed by at least one digit.
        Some(_) => {
            let frac = rest.as_str();
            !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

impl SuffixTagger {
    /// Guesses the tag of a single word.
    ///
    /// # Examples
    ///
    /// ```
    /// use thenthan::SuffixTagger;
    ///
    /// assert_eq!("VBG", SuffixTagger.tag_word("running"));
    /// assert_eq!("CD", SuffixTagger.tag_word("3.14"));
    /// assert_eq!("NN", SuffixTagger.tag_word("cat"));
    /// ```
    pub fn tag_word(&self, word: &str) -> &'static str {
        if word.ends_with("ing") {
            "VBG"
        } else if word.ends_with("ed") {
            "VBD"
        } else if word.ends_with("es") {
            "VBZ"
        } else if word.ends_with("ould") {
            "MD"
        } else if word.ends_with("'s") {
            "NN$"
        } else if word.ends_with('s') {
            "NNS"
        } else if is_number(word) {
            "CD"
        } else {
            "NN"
        }
    }
}

impl Tagger for SuffixTagger {
    fn tag(&self, tokens: &[&str]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| self.tag_word(t).to_string())
            .collect()
    }
}

#[derive(Decode, Encode)]
struct TaggerData {
    entries: Vec<(String, String)>,
}

/// Tagger that assigns each known word its most frequent tag in a training corpus and
/// falls back to [`SuffixTagger`] for unknown words.
#[derive(Debug, Clone, Default)]
pub struct UnigramTagger {
    lexicon: HashMap<String, String>,
    backoff: SuffixTagger,
}

impl UnigramTagger {
    /// Learns a lexicon from tagged sentences.
    ///
    /// Ties between equally frequent tags are broken by the lexicographic order of the tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use thenthan::{TaggedSentence, Tagger, UnigramTagger};
    ///
    /// let corpus = [TaggedSentence::from_tagged("bigger/JJR than/IN that/DT").unwrap()];
    /// let tagger = UnigramTagger::train(&corpus);
    /// assert_eq!(vec!["JJR", "IN", "VBG"], tagger.tag(&["bigger", "than", "flying"]));
    /// ```
    pub fn train<'a, I>(sentences: I) -> Self
    where
        I: IntoIterator<Item = &'a TaggedSentence>,
    {
        let mut counts: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
        for sentence in sentences {
            for token in sentence.tokens() {
                *counts
                    .entry(token.word())
                    .or_default()
                    .entry(token.tag())
                    .or_default() += 1;
            }
        }
        let lexicon = counts
            .into_iter()
            .filter_map(|(word, tags)| {
                tags.into_iter()
                    .max_by(|(t1, c1), (t2, c2)| c1.cmp(c2).then_with(|| t2.cmp(t1)))
                    .map(|(tag, _)| (word.to_string(), tag.to_string()))
            })
            .collect();
        Self {
            lexicon,
            backoff: SuffixTagger,
        }
    }

    /// Gets the number of words in the lexicon.
    pub fn n_words(&self) -> usize {
        self.lexicon.len()
    }

    /// Gets the tag of a single word.
    pub fn tag_word(&self, word: &str) -> &str {
        self.lexicon
            .get(word)
            .map_or_else(|| self.backoff.tag_word(word), String::as_str)
    }

    /// Exports the lexicon.
    ///
    /// # Errors
    ///
    /// When `wtr` generates an error, it will be returned as is.
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        let mut entries: Vec<(String, String)> = self
            .lexicon
            .iter()
            .map(|(w, t)| (w.clone(), t.clone()))
            .collect();
        // Sorted for a stable file layout.
        entries.sort_unstable();
        wtr.write_all(TAGGER_MAGIC)?;
        bincode::encode_into_std_write(
            TaggerData { entries },
            &mut wtr,
            bincode::config::standard(),
        )?;
        Ok(())
    }

    /// Creates a tagger from a reader.
    ///
    /// # Errors
    ///
    /// When `rdr` generates an error, it will be returned as is.
    /// If the data is not a tagger file, an error variant will be returned.
    pub fn read<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut magic = [0; 8];
        rdr.read_exact(&mut magic)?;
        if &magic != TAGGER_MAGIC {
            return Err(ThenThanError::invalid_model("not a tagger file"));
        }
        let config = bincode::config::standard().with_limit::<TAGGER_SIZE_LIMIT>();
        let data: TaggerData = bincode::decode_from_std_read(&mut rdr, config)?;
        Ok(Self {
            lexicon: data.entries.into_iter().collect(),
            backoff: SuffixTagger,
        })
    }
}

impl Tagger for UnigramTagger {
    fn tag(&self, tokens: &[&str]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| self.tag_word(t).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokenizer() {
        let toks = WordTokenizer.tokenize("  It's better than ever, and then  some!");

        assert_eq!(
            vec!["It's", "better", "than", "ever", ",", "and", "then", "some", "!"],
            toks
        );
    }

    #[test]
    fn test_word_tokenizer_empty() {
        assert!(WordTokenizer.tokenize(" \t ").is_empty());
    }

    #[test]
    fn test_suffix_tagger() {
        let tokens = [
            "running", "walked", "goes", "would", "John's", "cats", "-12", "3.5", "3.", "dog",
        ];

        assert_eq!(
            vec!["VBG", "VBD", "VBZ", "MD", "NN$", "NNS", "CD", "CD", "NN", "NN"],
            SuffixTagger.tag(&tokens)
        );
    }

    #[test]
    fn test_unigram_tagger_most_frequent() {
        let corpus = [
            TaggedSentence::from_tagged("that/CS is/BEZ it/PPS").unwrap(),
            TaggedSentence::from_tagged("that/DT dog/NN").unwrap(),
            TaggedSentence::from_tagged("that/DT cat/NN").unwrap(),
            TaggedSentence::from_tagged("run/VB run/NN").unwrap(),
        ];
        let tagger = UnigramTagger::train(&corpus);

        assert_eq!(6, tagger.n_words());
        assert_eq!("DT", tagger.tag_word("that"));
        // Tie between NN and VB.
        assert_eq!("NN", tagger.tag_word("run"));
        // Case-sensitive lookup falls back to the suffix rules.
        assert_eq!("NN", tagger.tag_word("That"));
        assert_eq!("VBD", tagger.tag_word("jumped"));
    }

    #[test]
    fn test_unigram_tagger_write_read() {
        let corpus = [TaggedSentence::from_tagged("and/CC then/RB we/PPSS left/VBD").unwrap()];
        let tagger = UnigramTagger::train(&corpus);

        let mut buf = vec![];
        tagger.write(&mut buf).unwrap();
        let restored = UnigramTagger::read(buf.as_slice()).unwrap();

        assert_eq!(4, restored.n_words());
        assert_eq!(
            vec!["CC", "RB", "PPSS", "VBD", "VBG"],
            restored.tag(&["and", "then", "we", "left", "going"])
        );
    }

    #[test]
    fn test_unigram_tagger_read_bad_magic() {
        assert!(UnigramTagger::read(&b"THENTHAN........"[..]).is_err());
    }
}
