use serde::{Deserialize, Serialize};

use crate::scoring::ContentFlags;
use crate::Post;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];
const HEAVY_PUNCTUATION: [char; 8] = [';', ':', '(', ')', '[', ']', '{', '}'];
const EM_DASH: char = '\u{2014}';

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyConfig {
    pub min_words: usize,
    pub brevity: f64,
    pub per_hashtag: f64,
    pub external_link: f64,
    pub per_em_dash: f64,
    pub complexity: ComplexityConfig,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            min_words: 5,
            brevity: 100.0,
            per_hashtag: 200.0,
            external_link: 50.0,
            per_em_dash: 200.0,
            complexity: ComplexityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityConfig {
    pub word_length_threshold: f64,
    pub word_length_weight: f64,
    pub sentence_length_threshold: f64,
    pub sentence_length_weight: f64,
    pub punctuation_allowance: usize,
    pub punctuation_weight: f64,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            word_length_threshold: 8.0,
            word_length_weight: 20.0,
            sentence_length_threshold: 25.0,
            sentence_length_weight: 5.0,
            punctuation_allowance: 5,
            punctuation_weight: 10.0,
        }
    }
}

/// Penalty magnitudes for one post. All values are non-negative and are
/// subtracted from the raw score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Penalties {
    pub brevity: f64,
    pub hashtags: f64,
    pub external_link: f64,
    pub complexity: f64,
    pub em_dashes: f64,
}

impl Penalties {
    pub fn total(&self) -> f64 {
        self.brevity + self.hashtags + self.external_link + self.complexity + self.em_dashes
    }
}

#[derive(Debug, Clone, Default)]
pub struct PenaltyCalculator {
    config: PenaltyConfig,
}

impl PenaltyCalculator {
    pub fn new(config: PenaltyConfig) -> Self {
        Self { config }
    }

    pub fn penalties(&self, post: &Post, flags: &ContentFlags) -> Penalties {
        Penalties {
            brevity: self.brevity(&post.text),
            hashtags: post.entities.hashtags.len() as f64 * self.config.per_hashtag,
            external_link: if flags.has_external_link {
                self.config.external_link
            } else {
                0.0
            },
            complexity: self.complexity(&post.text),
            em_dashes: count_em_dashes(&post.text) as f64 * self.config.per_em_dash,
        }
    }

    pub fn brevity(&self, text: &str) -> f64 {
        if word_count(text) < self.config.min_words {
            self.config.brevity
        } else {
            0.0
        }
    }

    pub fn complexity(&self, text: &str) -> f64 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0.0;
        }
        let config = &self.config.complexity;
        let mut penalty = 0.0;

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let avg_word_len =
            words.iter().map(|word| word_length(word)).sum::<usize>() as f64 / words.len() as f64;
        if avg_word_len > config.word_length_threshold {
            penalty += (avg_word_len - config.word_length_threshold) * config.word_length_weight;
        }

        if let Some(avg_sentence_len) = average_sentence_length(text) {
            if avg_sentence_len > config.sentence_length_threshold {
                penalty += (avg_sentence_len - config.sentence_length_threshold)
                    * config.sentence_length_weight;
            }
        }

        let punctuation = text
            .chars()
            .filter(|ch| HEAVY_PUNCTUATION.contains(ch))
            .count();
        if punctuation > config.punctuation_allowance {
            penalty += (punctuation - config.punctuation_allowance) as f64 * config.punctuation_weight;
        }

        penalty.round()
    }
}

/// Whitespace-separated tokens of the trimmed text. An empty text still counts as
/// a single (empty) token, so it never escapes the brevity penalty.
pub fn word_count(text: &str) -> usize {
    text.trim().split_whitespace().count().max(1)
}

/// Word length in UTF-16 code units, so characters outside the basic plane
/// (most emoji) count twice.
pub fn word_length(word: &str) -> usize {
    word.encode_utf16().count()
}

/// Mean words per sentence, or `None` when the text has no non-empty sentence
/// (for example a text made only of punctuation).
pub fn average_sentence_length(text: &str) -> Option<f64> {
    let lengths: Vec<usize> = text
        .split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(|sentence| sentence.split_whitespace().count())
        .collect();

    if lengths.is_empty() {
        return None;
    }
    Some(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
}

/// Em dash characters plus non-overlapping `--` sequences.
pub fn count_em_dashes(text: &str) -> usize {
    text.matches(EM_DASH).count() + text.matches("--").count()
}
