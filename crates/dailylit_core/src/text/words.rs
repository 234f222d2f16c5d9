//! Word counting shared by chunk sizing and document statistics.

use regex::Regex;
use std::sync::LazyLock;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}_]+").expect("valid word regex"));

/// Counts maximal runs of word characters (letters, digits, underscore).
/// Combining marks and joiners are not word characters.
pub fn count_words(text: &str) -> usize {
    WORD_PATTERN.find_iter(text).count()
}
