use super::*;

fn sentence_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_chunks_respect_sentence_boundaries() {
    let chunks = ChunkPlanner::new(2).plan("One. Two. Three. Four. Five.");

    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(
            chunk.text.ends_with(&['.', '!', '?'][..]),
            "chunk should end on a sentence terminator: {:?}",
            chunk.text
        );
    }
}

#[test]
fn test_small_sentences_are_packed_up_to_target() {
    let pages = ChunkPlanner::new(4).pack(sentence_list(&["a b.", "c d.", "e f.", "g."]));

    assert_eq!(pages, vec!["a b. c d.", "e f. g."]);
}

#[test]
fn test_full_page_is_closed_before_next_sentence() {
    let pages = ChunkPlanner::new(3).pack(sentence_list(&["a b c.", "d."]));

    assert_eq!(pages, vec!["a b c.", "d."]);
}

#[test]
fn test_oversized_sentence_gets_its_own_page() {
    let long = "one two three four five six seven.";
    let pages = ChunkPlanner::new(3).pack(sentence_list(&["a.", long, "b."]));

    assert_eq!(pages, vec!["a.".to_string(), long.to_string(), "b.".to_string()]);
}

#[test]
fn test_page_never_exceeds_target_unless_single_sentence() {
    let text = "The cat sat. It was warm and quiet. Birds sang outside the window all day. \
                Nothing moved. Then the door opened slowly. Everyone looked up at once.";
    let planner = ChunkPlanner::new(8);

    for chunk in planner.plan(text) {
        let words = count_words(&chunk.text);
        let sentences = split_sentences(&chunk.text).count();
        assert!(
            words <= planner.words_per_page() || sentences == 1,
            "page {} has {} words over {} sentences",
            chunk.page,
            words,
            sentences
        );
    }
}

#[test]
fn test_word_ranges_are_contiguous() {
    let text = "Mr. Smith went home. He slept for a long while. The sun rose. \
                Birds sang loudly outside! Did he wake? Eventually he did.";
    let chunks = ChunkPlanner::new(5).plan(text);

    assert!(chunks.len() > 1);
    assert_eq!(chunks[0].word_start, 1);
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].word_start, pair[0].word_end + 1);
    }
    for chunk in &chunks {
        assert_eq!(chunk.word_end + 1 - chunk.word_start, count_words(&chunk.text));
    }
    assert_eq!(chunks.last().unwrap().word_end, count_words(text));
}

#[test]
fn test_pages_are_numbered_from_one() {
    let chunks = ChunkPlanner::new(1).plan("A. B. C.");
    let pages: Vec<usize> = chunks.iter().map(|c| c.page).collect();

    assert_eq!(pages, vec![1, 2, 3]);
}

#[test]
fn test_empty_text_has_no_chunks() {
    assert!(ChunkPlanner::default().plan("").is_empty());
    assert!(ChunkPlanner::default().plan(" \n\n ").is_empty());
}

#[test]
fn test_planning_is_deterministic() {
    let text = "Call me Ishmael. Some years ago, never mind how long precisely, I went to sea. \
                It is a way I have of driving off the spleen.";
    let planner = ChunkPlanner::new(6);

    assert_eq!(planner.plan(text), planner.plan(text));
}

#[test]
fn test_zero_target_is_clamped() {
    let planner = ChunkPlanner::new(0);

    assert_eq!(planner.words_per_page(), 1);
    assert_eq!(planner.plan("A b. C d.").len(), 2);
}

#[test]
fn test_page_count() {
    let planner = ChunkPlanner::new(400);

    assert_eq!(planner.page_count(0), 1);
    assert_eq!(planner.page_count(7), 1);
    assert_eq!(planner.page_count(400), 1);
    assert_eq!(planner.page_count(401), 2);
    assert_eq!(planner.page_count(1200), 3);
}
