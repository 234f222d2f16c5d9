//! Sentence segmentation.
//!
//! A sentence ends at `.`, `!` or `?` followed directly by whitespace and then
//! an ASCII letter. Punctuation closed by a quote or bracket (`."`, `!)`) never
//! ends a sentence, so a quoted exclamation followed by a lowercase clause stays
//! in one piece. Known abbreviations are masked before boundary detection so
//! "Mr. Smith" is not split.

use regex::{Captures, Regex};
use std::sync::{Arc, LazyLock};

/// Abbreviations whose trailing period never ends a sentence.
///
/// Matched case-insensitively as plain substrings. Each entry is masked
/// independently, so the order carries no meaning.
pub const ABBREVIATIONS: [&str; 10] = [
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "vs.", "etc.",
];

/// Stands in for an abbreviation's period while boundaries are detected.
const SENTINEL: char = '\u{E000}';

static ABBREVIATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = ABBREVIATIONS
        .iter()
        .map(|abbr| regex::escape(abbr))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{})", alternatives)).expect("valid abbreviation regex")
});

static BOUNDARY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+[A-Za-z]").expect("valid boundary regex"));

fn protect_abbreviations(text: &str) -> String {
    ABBREVIATION_PATTERN
        .replace_all(text, |caps: &Captures| caps[0].replace('.', &SENTINEL.to_string()))
        .into_owned()
}

fn restore_abbreviations(text: &str) -> String {
    text.replace(SENTINEL, ".")
}

/// Splits `text` into trimmed sentences.
///
/// The returned iterator is lazy; clone it to restart from the first sentence.
pub fn split_sentences(text: &str) -> Sentences {
    Sentences {
        protected: Arc::from(protect_abbreviations(text)),
        position: 0,
    }
}

/// Iterator over the sentences of a text. See [`split_sentences`].
#[derive(Debug, Clone)]
pub struct Sentences {
    protected: Arc<str>,
    position: usize,
}

impl Iterator for Sentences {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.protected.len() {
            let start = self.position;
            let piece = match BOUNDARY_PATTERN.find_at(&self.protected, start) {
                // The punctuation and the letter are both single ASCII bytes.
                Some(boundary) => {
                    self.position = boundary.end() - 1;
                    &self.protected[start..boundary.start() + 1]
                }
                None => {
                    self.position = self.protected.len();
                    &self.protected[start..]
                }
            };

            let sentence = piece.trim();
            if !sentence.is_empty() {
                return Some(restore_abbreviations(sentence));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(text: &str) -> Vec<String> {
        split_sentences(text).collect()
    }

    #[test]
    fn empty_input_has_no_sentences() {
        assert!(sentences("").is_empty());
        assert!(sentences("   \n\t ").is_empty());
    }

    #[test]
    fn text_without_terminal_punctuation_is_one_sentence() {
        assert_eq!(
            sentences("  no punctuation at all here  "),
            vec!["no punctuation at all here"]
        );
    }

    #[test]
    fn abbreviations_do_not_end_sentences() {
        assert_eq!(
            sentences("Mr. Smith went home. He slept."),
            vec!["Mr. Smith went home.", "He slept."]
        );
        assert_eq!(
            sentences("She met DR. Jones and Prof. Lee. They talked."),
            vec!["She met DR. Jones and Prof. Lee.", "They talked."]
        );
    }

    #[test]
    fn quoted_period_before_lowercase_clause_is_not_a_boundary() {
        let result = sentences(r#"He said, "Wait." and left. next sentence starts lowercase."#);
        assert_eq!(result.len(), 2);
        assert!(result[0].contains(r#""Wait.""#));
        assert!(result[0].ends_with('.'));
        assert!(result[1].starts_with("next"));
    }

    #[test]
    fn quoted_terminator_keeps_clause_together() {
        assert_eq!(
            sentences(r#"She yelled "Stop!" and ran off. Nobody followed."#),
            vec![r#"She yelled "Stop!" and ran off."#, "Nobody followed."]
        );
    }

    #[test]
    fn lowercase_continuation_after_plain_period_starts_a_sentence() {
        assert_eq!(
            sentences("I came home. then I slept. It rained."),
            vec!["I came home.", "then I slept.", "It rained."]
        );
    }

    #[test]
    fn digits_after_terminator_do_not_split() {
        assert_eq!(sentences("Chapter 3. 42 pages remain."), vec!["Chapter 3. 42 pages remain."]);
    }

    #[test]
    fn splits_on_all_terminators() {
        assert_eq!(
            sentences("Really?  Yes!\nGood. Done"),
            vec!["Really?", "Yes!", "Good.", "Done"]
        );
    }

    #[test]
    fn iterator_restarts_when_cloned() {
        let mut iter = split_sentences("One. Two. Three.");
        let fresh = iter.clone();
        assert_eq!(iter.next().as_deref(), Some("One."));
        assert_eq!(fresh.count(), 3);
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn no_characters_are_lost() {
        let text = "Alpha beta. Gamma, delta! Epsilon? zeta eta. Theta";
        let rejoined: String = sentences(text).concat();
        let expected: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let actual: String = rejoined.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(actual, expected);
    }
}
