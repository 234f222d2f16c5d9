//! Text engine: sentence segmentation, word counting and page planning.

pub mod planner;
pub mod segmenter;
pub mod words;

pub use planner::{annotate_word_ranges, ChunkPlanner, DEFAULT_WORDS_PER_PAGE};
pub use segmenter::{split_sentences, Sentences, ABBREVIATIONS};
pub use words::count_words;

#[cfg(test)]
mod tests;
