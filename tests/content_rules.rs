use slop_score::scoring::classify::is_platform_url;
use slop_score::scoring::penalty::{
    average_sentence_length, count_em_dashes, word_count, word_length,
};
use slop_score::scoring::{ContentFlags, PenaltyCalculator, PostScorer};
use slop_score::{EmbeddedPost, Post};

const LONG_TEXT: &str = "A perfectly normal sentence with enough words";

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn retweet_detection_uses_structure_or_prefix() {
    let prefixed = Post::new("1", "  RT @bob: shipping today", 10);
    assert!(ContentFlags::classify(&prefixed).is_retweet);

    let lowercase = Post::new("2", "rt @bob: shipping today", 10);
    assert!(!ContentFlags::classify(&lowercase).is_retweet);

    let embedded = Post::new("3", LONG_TEXT, 10).retweeting(EmbeddedPost::default());
    assert!(ContentFlags::classify(&embedded).is_retweet);

    let mention = Post::new("4", "Thanks RT @bob for the tip", 10);
    assert!(!ContentFlags::classify(&mention).is_retweet);
}

#[test]
fn media_detection_covers_entities_and_shortlinks() {
    let plain = Post::new("1", LONG_TEXT, 10);
    assert!(!ContentFlags::classify(&plain).has_media);

    let with_url = Post::new("2", LONG_TEXT, 10).with_urls(["https://example.com"]);
    assert!(ContentFlags::classify(&with_url).has_media);

    let pic = Post::new("3", "new build pic.twitter.com/AbC123", 10);
    assert!(ContentFlags::classify(&pic).has_media);

    let shortlink = Post::new("4", "new build https://t.co/xyz", 10);
    assert!(ContentFlags::classify(&shortlink).has_media);
}

#[test]
fn text_flag_ignores_whitespace() {
    assert!(!ContentFlags::classify(&Post::new("1", "   \n\t", 10)).has_text);
    assert!(ContentFlags::classify(&Post::new("2", " hi ", 10)).has_text);
}

#[test]
fn platform_urls_are_matched_by_host() {
    assert!(is_platform_url("https://twitter.com/someone/status/1"));
    assert!(is_platform_url("https://www.twitter.com/someone"));
    assert!(is_platform_url("https://mobile.twitter.com/someone"));
    assert!(is_platform_url("https://pic.twitter.com/abc"));
    assert!(is_platform_url("https://x.com/someone/status/1"));
    assert!(is_platform_url("https://t.co/abc"));
    assert!(is_platform_url("HTTPS://X.COM/someone"));

    assert!(!is_platform_url("https://example.com/x.com"));
    assert!(!is_platform_url("https://nottwitter.com/post"));
    assert!(!is_platform_url("https://microsoft.com"));
    assert!(!is_platform_url(""));
    assert!(!is_platform_url("not a url"));
}

#[test]
fn external_link_flag_needs_a_non_platform_url() {
    let internal = Post::new("1", LONG_TEXT, 10).with_urls(["https://x.com/a/status/2"]);
    assert!(!ContentFlags::classify(&internal).has_external_link);

    let mixed = Post::new("2", LONG_TEXT, 10)
        .with_urls(["https://x.com/a/status/2", "https://blog.example.org/post"]);
    assert!(ContentFlags::classify(&mixed).has_external_link);

    let blank = Post::new("3", LONG_TEXT, 10).with_urls([""]);
    assert!(ContentFlags::classify(&blank).has_external_link);
}

#[test]
fn word_count_treats_empty_text_as_one_token() {
    assert_eq!(word_count(""), 1);
    assert_eq!(word_count("   "), 1);
    assert_eq!(word_count("one"), 1);
    assert_eq!(word_count("  one two\tthree\nfour  "), 4);
}

#[test]
fn brevity_penalty_applies_below_five_words() {
    let calculator = PenaltyCalculator::default();
    assert_close(calculator.brevity(""), 100.0);
    assert_close(calculator.brevity("one two three four"), 100.0);
    assert_close(calculator.brevity("one two three four five"), 0.0);
}

#[test]
fn sentence_length_handles_texts_without_sentences() {
    assert_eq!(average_sentence_length("...!?"), None);
    assert_eq!(average_sentence_length(""), None);
    assert_eq!(average_sentence_length("no punctuation here"), Some(3.0));
    assert_eq!(
        average_sentence_length("One two. Three four five six!"),
        Some(3.0)
    );
}

#[test]
fn em_dash_count_includes_double_hyphens() {
    assert_eq!(count_em_dashes("plain text"), 0);
    assert_eq!(count_em_dashes("a \u{2014} b"), 1);
    assert_eq!(count_em_dashes("a \u{2014} b -- c --- d"), 3);
    assert_eq!(count_em_dashes("a ---- b"), 2);
}

#[test]
fn complexity_penalizes_long_words() {
    let calculator = PenaltyCalculator::default();
    // average word length 59 / 3
    let penalty =
        calculator.complexity("internationalization characteristically incomprehensibilities");
    assert_close(penalty, 233.0);
}

#[test]
fn complexity_penalizes_long_sentences() {
    let calculator = PenaltyCalculator::default();
    let text = vec!["word"; 30].join(" ");
    assert_close(calculator.complexity(&text), 25.0);

    let split = format!("{}. {}.", vec!["word"; 15].join(" "), vec!["word"; 15].join(" "));
    assert_close(calculator.complexity(&split), 0.0);
}

#[test]
fn complexity_penalizes_heavy_punctuation() {
    let calculator = PenaltyCalculator::default();
    assert_close(calculator.complexity("a (b) [c] {d}; e: f"), 30.0);
    assert_close(calculator.complexity("a (b) c: d"), 0.0);
}

#[test]
fn complexity_is_zero_for_empty_or_punctuation_only_text() {
    let calculator = PenaltyCalculator::default();
    assert_close(calculator.complexity(""), 0.0);
    assert_close(calculator.complexity("... !!! ???"), 0.0);
}

#[test]
fn penalties_are_non_negative_and_sum_to_total() {
    let post = Post::new("1", "hi \u{2014} #tag", 10)
        .with_hashtags(["tag"])
        .with_urls(["https://example.com"]);
    let flags = ContentFlags::classify(&post);
    let penalties = PenaltyCalculator::default().penalties(&post, &flags);

    assert_close(penalties.brevity, 100.0);
    assert_close(penalties.hashtags, 200.0);
    assert_close(penalties.external_link, 50.0);
    assert_close(penalties.complexity, 0.0);
    assert_close(penalties.em_dashes, 200.0);
    assert_close(penalties.total(), 550.0);
}

#[test]
fn content_adjustments_stack_for_quotes_and_media() {
    let scorer = PostScorer::default();
    let media_url = "https://pic.twitter.com/abc";

    let illustrated = Post::new("1", LONG_TEXT, 1_000).with_urls([media_url]);
    assert_close(scorer.score(&illustrated).content_adjustment, 50.0);

    let quote = Post::new("2", LONG_TEXT, 1_000).quoting(EmbeddedPost::default());
    assert_close(scorer.score(&quote).content_adjustment, -50.0);

    let illustrated_quote = Post::new("3", LONG_TEXT, 1_000)
        .with_urls([media_url])
        .quoting(EmbeddedPost::default());
    assert_close(scorer.score(&illustrated_quote).content_adjustment, 25.0);

    let bare_media = Post::new("4", "", 1_000).with_urls([media_url]);
    assert_close(scorer.score(&bare_media).content_adjustment, 0.0);

    let retweet = Post::new("5", LONG_TEXT, 1_000)
        .with_urls([media_url])
        .quoting(EmbeddedPost::default())
        .retweeting(EmbeddedPost::default());
    assert_close(scorer.score(&retweet).content_adjustment, 0.0);
}

#[test]
fn word_length_counts_utf16_units() {
    assert_eq!(word_length("coffee"), 6);
    assert_eq!(word_length("caf\u{e9}"), 4);
    assert_eq!(word_length("\u{1F642}"), 2);

    // five emoji per word is ten units, two over the threshold
    let calculator = PenaltyCalculator::default();
    let emoji_word = "\u{1F642}".repeat(5);
    let text = vec![emoji_word.as_str(); 3].join(" ");
    assert_close(calculator.complexity(&text), 40.0);
}
