use tracing::warn;

use crate::domain::Chunk;
use crate::text::segmenter::split_sentences;
use crate::text::words::count_words;

/// Default target size of one page, in words.
pub const DEFAULT_WORDS_PER_PAGE: usize = 400;

/// Packs sentences into pages of roughly `words_per_page` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlanner {
    words_per_page: usize,
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self {
            words_per_page: DEFAULT_WORDS_PER_PAGE,
        }
    }
}

impl ChunkPlanner {
    /// Creates a planner. A target of zero words is clamped to one.
    pub fn new(words_per_page: usize) -> Self {
        if words_per_page == 0 {
            warn!("words_per_page must be at least 1; using 1");
        }
        Self {
            words_per_page: words_per_page.max(1),
        }
    }

    pub fn words_per_page(&self) -> usize {
        self.words_per_page
    }

    /// Number of pages a document of `total_words` words is billed as.
    pub fn page_count(&self, total_words: usize) -> usize {
        total_words.div_ceil(self.words_per_page).max(1)
    }

    /// Segments `text` and returns its pages with absolute word ranges.
    ///
    /// Empty or whitespace-only text yields no chunks.
    pub fn plan(&self, text: &str) -> Vec<Chunk> {
        annotate_word_ranges(self.pack(split_sentences(text)))
    }

    /// Greedily packs whole sentences into pages.
    ///
    /// A page is closed before a sentence is added if it already holds the
    /// target, or if the sentence would push it over. A single sentence longer
    /// than the target becomes its own page; sentences are never cut.
    pub fn pack<I>(&self, sentences: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut pages = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_words = 0;

        for sentence in sentences {
            let sentence_words = count_words(&sentence);

            if !current.is_empty() && current_words >= self.words_per_page {
                pages.push(join_sentences(&current));
                current.clear();
                current_words = 0;
            }

            if !current.is_empty() && current_words + sentence_words > self.words_per_page {
                pages.push(join_sentences(&current));
                current.clear();
                current_words = 0;
            }

            current_words += sentence_words;
            current.push(sentence);
        }

        if !current.is_empty() {
            pages.push(join_sentences(&current));
        }

        pages
    }
}

fn join_sentences(sentences: &[String]) -> String {
    sentences.join(" ").trim().to_string()
}

/// Attaches 1-indexed page numbers and cumulative inclusive word ranges.
pub fn annotate_word_ranges(pages: Vec<String>) -> Vec<Chunk> {
    let mut position = 0;
    pages
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let words = count_words(&text);
            let chunk = Chunk {
                page: index + 1,
                word_start: position + 1,
                word_end: position + words,
                text,
            };
            position += words;
            chunk
        })
        .collect()
}
