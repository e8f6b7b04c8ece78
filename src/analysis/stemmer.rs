//! Stemming algorithms for reducing words to their root forms.

use crate::analysis::filter::Filter;
use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// Trait for stemming algorithms.
pub trait Stemmer: Send + Sync + std::fmt::Debug {
    /// Stem a word to its root form.
    fn stem(&self, word: &str) -> String;

    /// Get the name of this stemmer.
    fn name(&self) -> &'static str;
}

/// Porter stemming algorithm implementation.
///
/// Applies the classic five-step suffix rewrite rules. Words of one or
/// two characters, and words containing non-ASCII characters, are only
/// lowercased.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }

    /// Check if the character at `pos` acts as a vowel.
    ///
    /// `y` counts as a vowel when it follows a consonant.
    fn is_vowel(&self, word: &str, pos: usize) -> bool {
        let bytes = word.as_bytes();
        if pos >= bytes.len() {
            return false;
        }

        match bytes[pos].to_ascii_lowercase() {
            b'a' | b'e' | b'i' | b'o' | b'u' => true,
            b'y' if pos > 0 => !self.is_vowel(word, pos - 1),
            _ => false,
        }
    }

    /// Calculate the measure of a word (number of VC patterns).
    fn measure(&self, word: &str) -> usize {
        let mut m = 0;
        let n = word.len();
        let mut i = 0;

        // Skip initial consonants
        while i < n && !self.is_vowel(word, i) {
            i += 1;
        }

        // Count VC patterns
        while i < n {
            while i < n && self.is_vowel(word, i) {
                i += 1;
            }

            if i >= n {
                break;
            }

            m += 1;

            while i < n && !self.is_vowel(word, i) {
                i += 1;
            }
        }

        m
    }

    fn ends_with(&self, word: &str, suffix: &str) -> bool {
        word.len() >= suffix.len() && word[word.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    }

    /// Replace `old_suffix` with `new_suffix` when the remaining stem
    /// has at least `min_measure` VC patterns.
    fn replace_suffix(
        &self,
        word: &str,
        old_suffix: &str,
        new_suffix: &str,
        min_measure: usize,
    ) -> String {
        if self.ends_with(word, old_suffix) {
            let stem = &word[..word.len() - old_suffix.len()];
            if self.measure(stem) >= min_measure {
                return format!("{stem}{new_suffix}");
            }
        }
        word.to_string()
    }

    fn contains_vowel(&self, word: &str) -> bool {
        (0..word.len()).any(|i| self.is_vowel(word, i))
    }

    fn ends_double_consonant(&self, word: &str) -> bool {
        let bytes = word.as_bytes();
        let len = bytes.len();
        len >= 2 && bytes[len - 1] == bytes[len - 2] && !self.is_vowel(word, len - 1)
    }

    /// Check for a trailing consonant-vowel-consonant pattern where the
    /// final consonant is not `w`, `x` or `y`.
    fn ends_cvc(&self, word: &str) -> bool {
        let len = word.len();
        if len < 3 {
            return false;
        }

        !self.is_vowel(word, len - 3)
            && self.is_vowel(word, len - 2)
            && !self.is_vowel(word, len - 1)
            && !matches!(word.as_bytes()[len - 1], b'w' | b'x' | b'y')
    }

    /// Step 1a: plural forms.
    fn step1a(&self, word: &str) -> String {
        if self.ends_with(word, "sses") {
            format!("{}ss", &word[..word.len() - 4])
        } else if self.ends_with(word, "ies") {
            format!("{}i", &word[..word.len() - 3])
        } else if self.ends_with(word, "ss") {
            word.to_string()
        } else if self.ends_with(word, "s") && word.len() > 1 {
            word[..word.len() - 1].to_string()
        } else {
            word.to_string()
        }
    }

    /// Step 1b: -eed, -ed and -ing suffixes.
    fn step1b(&self, word: &str) -> String {
        let stripped = if self.ends_with(word, "eed") {
            self.replace_suffix(word, "eed", "ee", 1)
        } else if self.ends_with(word, "ed") {
            let stem = &word[..word.len() - 2];
            if self.contains_vowel(stem) {
                stem.to_string()
            } else {
                word.to_string()
            }
        } else if self.ends_with(word, "ing") {
            let stem = &word[..word.len() - 3];
            if self.contains_vowel(stem) {
                stem.to_string()
            } else {
                word.to_string()
            }
        } else {
            return word.to_string();
        };

        // Cleanup applies only when a suffix was actually removed.
        if stripped == word {
            return stripped;
        }

        if self.ends_with(&stripped, "at")
            || self.ends_with(&stripped, "bl")
            || self.ends_with(&stripped, "iz")
        {
            format!("{stripped}e")
        } else if self.ends_double_consonant(&stripped)
            && !matches!(
                stripped.as_bytes().last(),
                Some(b'l') | Some(b's') | Some(b'z')
            )
        {
            stripped[..stripped.len() - 1].to_string()
        } else if self.measure(&stripped) == 1 && self.ends_cvc(&stripped) {
            format!("{stripped}e")
        } else {
            stripped
        }
    }

    /// Step 2: map double suffixes to single ones.
    fn step2(&self, word: &str) -> String {
        let rules = [
            ("ational", "ate"),
            ("tional", "tion"),
            ("enci", "ence"),
            ("anci", "ance"),
            ("izer", "ize"),
            ("abli", "able"),
            ("alli", "al"),
            ("entli", "ent"),
            ("eli", "e"),
            ("ousli", "ous"),
            ("ization", "ize"),
            ("ation", "ate"),
            ("ator", "ate"),
            ("alism", "al"),
            ("iveness", "ive"),
            ("fulness", "ful"),
            ("ousness", "ous"),
            ("aliti", "al"),
            ("iviti", "ive"),
            ("biliti", "ble"),
        ];

        for (old_suffix, new_suffix) in rules {
            if self.ends_with(word, old_suffix) {
                return self.replace_suffix(word, old_suffix, new_suffix, 1);
            }
        }

        word.to_string()
    }

    /// Step 3: -icate, -ative, -alize and friends.
    fn step3(&self, word: &str) -> String {
        let rules = [
            ("icate", "ic"),
            ("ative", ""),
            ("alize", "al"),
            ("iciti", "ic"),
            ("ical", "ic"),
            ("ful", ""),
            ("ness", ""),
        ];

        for (old_suffix, new_suffix) in rules {
            if self.ends_with(word, old_suffix) {
                return self.replace_suffix(word, old_suffix, new_suffix, 1);
            }
        }

        word.to_string()
    }

    /// Step 4: strip remaining derivational suffixes.
    fn step4(&self, word: &str) -> String {
        let suffixes = [
            "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion",
            "ou", "ism", "ate", "iti", "ous", "ive", "ize",
        ];

        for suffix in suffixes {
            if !self.ends_with(word, suffix) {
                continue;
            }
            let stem = &word[..word.len() - suffix.len()];
            // "ion" is only stripped after s or t.
            if self.measure(stem) > 1
                && (suffix != "ion" || self.ends_with(stem, "s") || self.ends_with(stem, "t"))
            {
                return stem.to_string();
            }
        }

        word.to_string()
    }

    /// Step 5: final -e and -ll.
    fn step5(&self, word: &str) -> String {
        let word = if self.ends_with(word, "e") {
            let stem = &word[..word.len() - 1];
            let m = self.measure(stem);
            if m > 1 || (m == 1 && !self.ends_cvc(stem)) {
                stem.to_string()
            } else {
                word.to_string()
            }
        } else {
            word.to_string()
        };

        if self.ends_with(&word, "ll") && self.measure(&word) > 1 {
            word[..word.len() - 1].to_string()
        } else {
            word
        }
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();
        if word.len() <= 2 || !word.is_ascii() {
            return word;
        }

        let word = self.step1a(&word);
        let word = self.step1b(&word);
        let word = self.step2(&word);
        let word = self.step3(&word);
        let word = self.step4(&word);
        self.step5(&word)
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}

/// Filter that replaces each token's text with its stem.
#[derive(Debug)]
pub struct StemFilter {
    stemmer: Box<dyn Stemmer>,
}

impl StemFilter {
    /// Create a new stem filter with the Porter stemmer.
    pub fn new() -> Self {
        StemFilter {
            stemmer: Box::new(PorterStemmer::new()),
        }
    }

    /// Create a stem filter with a custom stemmer.
    pub fn with_stemmer(stemmer: Box<dyn Stemmer>) -> Self {
        StemFilter { stemmer }
    }
}

impl Default for StemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StemFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let stemmed_tokens: Vec<Token> = tokens
            .map(|token| {
                let stemmed = self.stemmer.stem(&token.text);
                token.with_text(stemmed)
            })
            .collect();

        Ok(Box::new(stemmed_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porter_stemmer() {
        let stemmer = PorterStemmer::new();

        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("flies"), "fli");
        assert_eq!(stemmer.stem("died"), "di");
        assert_eq!(stemmer.stem("agreed"), "agre");
        assert_eq!(stemmer.stem("disabled"), "disabl");
        assert_eq!(stemmer.stem("measuring"), "measur");
        assert_eq!(stemmer.stem("itemization"), "item");
        assert_eq!(stemmer.stem("sensational"), "sensat");
        assert_eq!(stemmer.stem("traditional"), "tradit");
    }

    #[test]
    fn test_porter_short_words_unchanged() {
        let stemmer = PorterStemmer::new();

        assert_eq!(stemmer.stem("at"), "at");
        assert_eq!(stemmer.stem("Be"), "be");
        assert_eq!(stemmer.stem("I"), "i");
    }

    #[test]
    fn test_porter_non_ascii_unchanged() {
        let stemmer = PorterStemmer::new();

        assert_eq!(stemmer.stem("naïve"), "naïve");
        assert_eq!(stemmer.stem("Öffnung"), "öffnung");
    }

    #[test]
    fn test_porter_measure() {
        let stemmer = PorterStemmer::new();

        assert_eq!(stemmer.measure("tree"), 0);
        assert_eq!(stemmer.measure("trees"), 1);
        assert_eq!(stemmer.measure("trouble"), 1);
        assert_eq!(stemmer.measure("troubles"), 2);
    }

    #[test]
    fn test_porter_vowel_detection() {
        let stemmer = PorterStemmer::new();
        let word = "trouble";

        assert!(!stemmer.is_vowel(word, 0)); // t
        assert!(!stemmer.is_vowel(word, 1)); // r
        assert!(stemmer.is_vowel(word, 2)); // o
        assert!(stemmer.is_vowel(word, 3)); // u
        assert!(!stemmer.is_vowel(word, 4)); // b
        assert!(!stemmer.is_vowel(word, 5)); // l
        assert!(stemmer.is_vowel(word, 6)); // e
    }

    #[test]
    fn test_stem_filter() {
        let filter = StemFilter::new();
        let tokens = vec![Token::new("running", 0), Token::new("flies", 1)];
        let token_stream: TokenStream = Box::new(tokens.into_iter());

        let result: Vec<Token> = filter.filter(token_stream).unwrap().collect();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "run");
        assert_eq!(result[1].text, "fli");
        assert_eq!(result[0].position, 0);
        assert_eq!(result[1].position, 1);
    }
}
