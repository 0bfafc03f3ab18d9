use once_cell::sync::Lazy;
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid sentiment lexicon")
});

/// Polarity flip applied to a word preceded by a negator ("not good" is mildly negative).
const NEGATION_FACTOR: f64 = -0.5;

/// Text polarity in [-1.0, 1.0]. Implementations must return exactly 0.0 for empty input.
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;

    /// Scores a video's comments as one block, joined by a single space in fetch order.
    fn score_comments(&self, comments: &[String]) -> f64 {
        self.polarity(&comments.join(" "))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_polarity(&self, w: &str) -> f64 {
        LEXICON.get(w).copied().unwrap_or(0.0)
    }
}

impl PolarityScorer for LexiconScorer {
    /// Mean polarity of the lexicon words found in `text`.
    /// A negator among the three previous tokens flips and damps the word;
    /// an intensifier right before it scales it.
    fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut total = 0.0;
        let mut hits = 0usize;

        for i in 0..tokens.len() {
            let base = self.word_polarity(tokens[i].as_str());
            if base == 0.0 {
                continue;
            }

            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            let boost = if i >= 1 {
                intensifier(tokens[i - 1].as_str())
            } else {
                1.0
            };

            let mut p = (base * boost).clamp(-1.0, 1.0);
            if negated {
                p *= NEGATION_FACTOR;
            }
            total += p;
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        (total / hits as f64).clamp(-1.0, 1.0)
    }
}

/// Lower-cased word tokens; apostrophes stay inside words so "isn't" survives.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.replace('\u{2019}', "'").to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "don't"
            | "doesn't"
            | "didn't"
            | "can't"
            | "cannot"
            | "without"
            | "nothing"
            | "hardly"
    )
}

fn intensifier(tok: &str) -> f64 {
    match tok {
        "very" | "really" | "extremely" | "super" | "so" | "totally" => 1.3,
        "absolutely" | "incredibly" | "highly" => 1.5,
        "quite" | "pretty" => 1.1,
        "slightly" | "somewhat" | "bit" => 0.6,
        _ => 1.0,
    }
}
