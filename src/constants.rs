//! Global Constants
//!
//! Default values for every tunable threshold. Configuration (`config::types`)
//! takes its defaults from here; the engine never hard-codes these numbers.

/// Topic matching and classification constants
pub mod matching {
    /// Minimum |A ∩ B| / max(|A|, |B|) for two topic keys to match
    pub const TOPIC_OVERLAP_THRESHOLD: f64 = 0.70;

    /// Content Jaccard similarity at which two sections are duplicates
    pub const CONTENT_DUPLICATE_THRESHOLD: f64 = 0.80;

    /// Relevance to the primary subject below which a section is off-topic
    pub const OFF_TOPIC_THRESHOLD: f64 = 0.10;

    /// Usable competitor documents required for a non-trivial topic set
    pub const MIN_COMPETITORS: usize = 2;

    /// Competitors that must cover a topic before it is a gap
    pub const MIN_OCCURRENCE: usize = 2;

    /// Example phrasings kept per topic
    pub const MAX_EXAMPLE_HEADINGS: usize = 3;

    /// Subheadings attached to a structurally complex topic
    pub const MAX_SUBHEADINGS: usize = 5;
}

/// Quality scoring constants
pub mod quality {
    /// Weight split (must sum to 100)
    pub const DENSITY_WEIGHT: u8 = 50;
    pub const LENGTH_WEIGHT: u8 = 25;
    pub const GENERIC_WEIGHT: u8 = 25;

    /// Elements per 100 words that earns the full density weight
    pub const TARGET_DENSITY: f64 = 2.0;

    /// Low-information phrases per 100 words that zeroes the generic weight
    pub const MAX_GENERIC_RATE: f64 = 3.0;

    /// Ideal section length band (words)
    pub const IDEAL_MIN_WORDS: usize = 100;
    pub const IDEAL_MAX_WORDS: usize = 300;

    /// Below this many words a section is flagged as thin
    pub const THIN_CONTENT_WORDS: usize = 50;

    /// Scores below this trigger IMPROVE (depth) and the `smart` strategy
    pub const IMPROVE_THRESHOLD: u8 = 60;

    /// Share of heading keywords the content should mention
    pub const MIN_KEYWORD_COVERAGE: f64 = 0.5;

    pub const LOW_INFORMATION_PHRASES: &[&str] = &[
        "delve",
        "moreover",
        "furthermore",
        "notably",
        "essentially",
        "basically",
        "in today's digital landscape",
        "in today's fast-paced world",
        "it is important to note",
        "it's worth noting",
        "plays a crucial role",
        "cutting-edge",
        "state-of-the-art",
        "revolutionize",
        "game-changer",
        "seamless",
        "leverage",
        "utilize",
        "robust",
        "unlock the power",
        "a wide range of",
        "in conclusion",
    ];
}

/// Overall improvement score
pub mod improvement {
    /// Bonus when the plan adds missing sections
    pub const ADD_BONUS: f64 = 10.0;

    /// Bonus when the plan removes unnecessary sections
    pub const REMOVE_BONUS: f64 = 5.0;

    /// Word growth contributes 10 points per 100%, capped at this magnitude
    pub const WORD_DELTA_CAP: f64 = 20.0;
}

/// Merge engine constants
pub mod merge {
    /// Elements kept by the `smart` strategy
    pub const TOP_K: usize = 5;

    /// Token containment for an element to count as already present
    pub const FUZZY_THRESHOLD: f64 = 0.80;

    /// Normalized Levenshtein at which two words count as the same word
    pub const WORD_SIMILARITY: f64 = 0.85;

    pub const SEPARATOR: &str = "\n\n";
}

/// Collaborator constants
pub mod network {
    /// Concurrent competitor fetches
    pub const FETCH_CONCURRENCY: usize = 5;

    /// Concurrent section generations
    pub const GENERATION_CONCURRENCY: usize = 3;

    /// Per-section generation timeout (seconds)
    pub const GENERATION_TIMEOUT_SECS: u64 = 120;

    /// Per-document fetch timeout (seconds)
    pub const FETCH_TIMEOUT_SECS: u64 = 30;
}
