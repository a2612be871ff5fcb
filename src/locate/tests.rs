use super::*;

fn section(id: &str, title: &str, cue: &str) -> SectionDescriptor {
    SectionDescriptor {
        id: id.to_string(),
        level: 1,
        title: title.to_string(),
        cue: cue.to_string(),
        document_order: 0,
    }
}

fn words(text: &str) -> Vec<String> {
    normalize_words(text)
}

#[test]
fn flexible_whitespace_matches_exact_substring_offset() {
    let raw = "Preamble\nArticle 5\nPrinciples relating to processing of personal data";
    let found = locate(raw, "Principles relating to processing", 0).expect("cue should match");

    assert_eq!(found.offset, raw.find("Principles").expect("fixture contains cue"));
    assert_eq!(found.strategy, CascadeStrategy::FlexibleWhitespace);
}

#[test]
fn flexible_whitespace_tolerates_reflowed_cue_and_case() {
    let raw = "Preamble\nArticle 5\nPrinciples relating to processing of personal data";
    let expected = raw.find("Principles").expect("fixture contains cue");

    let reflowed = locate(raw, "Principles\nrelating   to\n\tprocessing", 0)
        .expect("reflowed cue should match");
    assert_eq!(reflowed.offset, expected);
    assert_eq!(reflowed.strategy, CascadeStrategy::FlexibleWhitespace);

    let shouted = locate(raw, "PRINCIPLES RELATING", 0).expect("case-insensitive match");
    assert_eq!(shouted.offset, expected);
}

#[test]
fn flexible_whitespace_spans_line_breaks_in_document() {
    let raw = "intro\nPersonal data\n   shall be\nprocessed lawfully";
    let found = locate(raw, "personal data shall be processed lawfully", 0)
        .expect("cue should match across line breaks");

    assert_eq!(found.offset, 6);
    assert_eq!(found.strategy, CascadeStrategy::FlexibleWhitespace);
}

#[test]
fn word_prefix_handles_diverging_tail() {
    let raw = "1. Personal data shall be processed lawfully, fairly";
    let found = locate(raw, "Personal data shall be processed quietly elsewhere", 0)
        .expect("prefix should match");

    assert_eq!(found.offset, 3);
    assert_eq!(found.strategy, CascadeStrategy::WordPrefix);
}

#[test]
fn loose_prefix_handles_missing_whitespace() {
    let raw = "see Article5Scope applies";
    let found = locate(raw, "Article 5 Scope mismatch words here", 0).expect("loose prefix");

    assert_eq!(found.offset, 4);
    assert_eq!(found.strategy, CascadeStrategy::LoosePrefix);
}

#[test]
fn salient_skip_gram_tolerates_inserted_text() {
    let raw = "Recital. The controller, where necessary, shall promptly implement appropriate technical measures.";
    let found = locate(raw, "controller shall implement appropriate measures", 0)
        .expect("skip-gram should match");

    assert_eq!(found.offset, raw.find("controller").expect("fixture"));
    assert_eq!(found.strategy, CascadeStrategy::SalientSkipGram);
}

#[test]
fn salient_pair_is_last_resort() {
    let raw = "If a personal data leak or breach occurs the authority is told.";
    let found = locate(raw, "data breach notification obligations", 0).expect("pair match");

    assert_eq!(found.offset, raw.find("data").expect("fixture"));
    assert_eq!(found.strategy, CascadeStrategy::SalientPair);
}

#[test]
fn cascade_exhaustion_returns_none() {
    assert!(locate("nothing relevant here", "zebra quantum", 0).is_none());
    assert!(locate("anything", "   ", 0).is_none());
    assert!(locate("short", "short", 99).is_none());
}

#[test]
fn search_start_skips_earlier_matches() {
    let raw = "alpha beta alpha beta";
    let found = locate(raw, "alpha beta", 1).expect("second occurrence");

    assert_eq!(found.offset, 11);
}

#[test]
fn regex_metacharacters_in_cue_are_literal() {
    let raw = "See Section 2.01(b) [reserved] for details; Section 2x01(b) differs.";
    let found = locate(raw, "Section 2.01(b) [reserved]", 0).expect("literal match");

    assert_eq!(found.offset, 4);
}

#[test]
fn normalize_words_lowercases_and_splits_on_punctuation() {
    assert_eq!(
        words("Hello, World! It's   Article-5."),
        vec!["hello", "world", "it", "s", "article", "5"]
    );
}

#[test]
fn fuzzy_sequence_tolerates_one_substituted_word() {
    let index = WordIndex::build("Once upon a time the quick red fox jumps over the lazy dog.");
    let cue = words("the quick brown fox jumps");

    assert!(index.find_exact(&cue, WindowConfig::default()).is_none());

    let hit = index
        .find_fuzzy(&cue, WindowConfig::default(), 0.8)
        .expect("one substitution keeps ratio at 0.8");
    assert_eq!(hit.token_index, 4);
    assert!((hit.ratio - 0.8).abs() < f64::EPSILON);
}

#[test]
fn fuzzy_sequence_rejects_below_threshold_and_prefers_first_tie() {
    let index = WordIndex::build("a b c x x z z a b c y y");
    let windows = WindowConfig::default();

    let cue = words("a b c d e");
    assert!(index.find_fuzzy(&cue, windows, 0.8).is_none());

    let tie = index
        .find_fuzzy(&words("a b c q q"), windows, 0.6)
        .expect("two runs reach 0.6");
    assert_eq!(tie.token_index, 0);
}

#[test]
fn exact_sequence_found_across_window_boundaries() {
    let index = WordIndex::build("w0 w1 w2 w3 w4 w5 w6 w7 w8 w9");
    let tight = WindowConfig {
        window_words: 4,
        overlap_words: 0,
    };

    assert_eq!(index.find_exact(&words("w3 w4 w5 w6 w7"), tight), Some(3));
    assert_eq!(index.find_exact(&words("w3 w4"), tight), Some(3));
    assert_eq!(index.find_exact(&words("w8 w9"), tight), Some(8));
    assert_eq!(index.len(), 10);
}

#[test]
fn fuzzy_sequence_found_across_window_boundaries() {
    let index = WordIndex::build("w0 w1 w2 w3 w4 w5 w6 w7 w8 w9");
    let tight = WindowConfig {
        window_words: 3,
        overlap_words: 0,
    };

    let hit = index
        .find_fuzzy(&words("w2 w3 w4 w5 nope"), tight, 0.8)
        .expect("straddling fuzzy run");
    assert_eq!(hit.token_index, 2);
}

#[test]
fn heading_offset_recovered_from_title_before_cue() {
    let raw = "Recitals end here.\n\nARTICLE 5\nPrinciples relating to processing of personal data\n1. Personal data shall be";
    let locator = SectionLocator::new(raw, LocatorConfig::default());
    let hit = locator
        .locate_section(&section(
            "h3",
            "Article 5",
            "Principles relating to processing of personal data",
        ))
        .expect("section should be located");

    assert_eq!(hit.offset, raw.find("ARTICLE 5").expect("fixture"));
    assert_eq!(hit.method, LocateMethod::ExactSequence);
}

#[test]
fn heading_offset_takes_rightmost_title_in_lookback() {
    let raw = "Article 5 is cited here. Article 5\nPrinciples relating to processing of personal data";
    let hit = recover_heading_offset(raw, "Article 5", raw.find("Principles").expect("fixture"), 500);

    assert_eq!(hit, Some(25));
}

#[test]
fn heading_offset_falls_back_to_sequence_hit() {
    let raw = "Principles relating to processing of personal data apply.";
    let locator = SectionLocator::new(raw, LocatorConfig::default());
    let hit = locator
        .locate_section(&section(
            "h3",
            "Chapter Nine",
            "principles relating to processing of personal",
        ))
        .expect("section should be located");

    assert_eq!(hit.offset, 0);
    assert_eq!(hit.method, LocateMethod::ExactSequence);
}

#[test]
fn heading_lookback_is_bounded() {
    let raw = format!("Article 5\n{}Principles relating to processing", "filler ".repeat(20));
    let hit = raw.find("Principles").expect("fixture");

    assert_eq!(recover_heading_offset(&raw, "Article 5", hit, 10), None);
    assert_eq!(recover_heading_offset(&raw, "Article 5", hit, 500), Some(0));
}

#[test]
fn short_cue_uses_cascade() {
    let raw = "Scope\nThis Regulation applies";
    let locator = SectionLocator::new(raw, LocatorConfig::default());
    let hit = locator
        .locate_section(&section("h1", "Scope", "This Regulation applies"))
        .expect("cue should match");

    assert_eq!(hit.offset, 6);
    assert_eq!(
        hit.method,
        LocateMethod::Cascade(CascadeStrategy::FlexibleWhitespace)
    );
}

#[test]
fn falls_back_to_title_then_id_token() {
    let raw = "See h70 first. ANNEX  II\nlist of things; h7 marks the spot.";
    let locator = SectionLocator::new(raw, LocatorConfig::default());

    let by_title = locator
        .locate_section(&section("h2", "Annex II", ""))
        .expect("title fallback");
    assert_eq!(by_title.offset, raw.find("ANNEX").expect("fixture"));
    assert_eq!(by_title.method, LocateMethod::Title);

    let by_id = locator
        .locate_section(&section("h7", "Missing heading", "no such cue anywhere"))
        .expect("id fallback");
    assert_eq!(by_id.offset, raw.find("h7 marks").expect("fixture"));
    assert_eq!(by_id.method, LocateMethod::IdToken);

    assert!(
        locator
            .locate_section(&section("h9", "Missing heading", ""))
            .is_none()
    );
}
