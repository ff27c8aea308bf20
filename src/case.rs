use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Grammatical case of an object slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Dative,
    Accusative,
}

impl Case {
    /// Accepts the spellings used in verb data: `dative`/`dat`/`dativ`,
    /// `accusative`/`akk`/`akkusativ`.
    pub fn parse(value: &str) -> Option<Case> {
        match value.trim().to_lowercase().as_str() {
            "dative" | "dat" | "dativ" => Some(Case::Dative),
            "accusative" | "akk" | "akkusativ" => Some(Case::Accusative),
            _ => None,
        }
    }

    /// Name shown to learners.
    pub fn german_name(&self) -> &'static str {
        match self {
            Case::Dative => "Dativ",
            Case::Accusative => "Akkusativ",
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Case::Dative => write!(f, "dative"),
            Case::Accusative => write!(f, "accusative"),
        }
    }
}

// ----------------- Markers -----------------

const DATIVE_MARKERS: &[&str] = &[
    "dem", "der", "einem", "einer", "keinem", "keiner", "meinem", "meiner", "deinem", "deiner",
    "seinem", "seiner", "ihrem", "ihrer", "unserem", "unserer", "eurem", "eurer", "diesem",
    "dieser", "mir", "dir", "ihm", "ihnen",
];

const ACCUSATIVE_MARKERS: &[&str] = &[
    "das", "die", "ein", "eine", "einen", "kein", "keine", "keinen", "mein", "meine", "meinen",
    "dein", "deine", "deinen", "sein", "seine", "seinen", "ihre", "unser", "unsere", "unseren",
    "euer", "eure", "euren", "dieses", "diese", "diesen", "mich", "dich", "ihn", "sie", "es",
    "etwas",
];

// den Bus / den Kindern, uns, euch, ihr Buch / ihr (dative pronoun)
const AMBIGUOUS_MARKERS: &[&str] = &["den", "ihren", "uns", "euch", "ihr"];

fn marker_regex(words: &[&str]) -> Regex {
    Regex::new(&format!("(?i)^(?:{})$", words.join("|")))
        .expect("marker word lists only contain letters")
}

static LEADING_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\p{L}+)").expect("leading word pattern is valid"));
static DATIVE: LazyLock<Regex> = LazyLock::new(|| marker_regex(DATIVE_MARKERS));
static ACCUSATIVE: LazyLock<Regex> = LazyLock::new(|| marker_regex(ACCUSATIVE_MARKERS));
static AMBIGUOUS: LazyLock<Regex> = LazyLock::new(|| marker_regex(AMBIGUOUS_MARKERS));

/// What the leading determiner or pronoun of a fixed object string says
/// about its case.
///
/// Object strings come from data and are never declined here; the marking
/// is only used to check that data is consistent with the case a verb
/// declares, and to tell the two objects of a ditransitive verb apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMarking {
    Dative,
    Accusative,
    /// The leading word is a form shared by both cases (`den`, `uns`, ...).
    Ambiguous,
    /// No determiner or pronoun (`Kaffee`, `zehn Euro`).
    Unmarked,
}

impl CaseMarking {
    pub fn of(object: &str) -> CaseMarking {
        let Some(word) = LEADING_WORD.captures(object).and_then(|c| c.get(1)) else {
            return CaseMarking::Unmarked;
        };
        let word = word.as_str();

        if AMBIGUOUS.is_match(word) {
            CaseMarking::Ambiguous
        } else if DATIVE.is_match(word) {
            CaseMarking::Dative
        } else if ACCUSATIVE.is_match(word) {
            CaseMarking::Accusative
        } else {
            CaseMarking::Unmarked
        }
    }

    /// Bare nouns are accepted as accusative objects only; a dative object
    /// has to carry a dative or shared marker.
    pub fn admits(self, case: Case) -> bool {
        matches!(
            (self, case),
            (CaseMarking::Ambiguous, _)
                | (CaseMarking::Dative, Case::Dative)
                | (CaseMarking::Accusative, Case::Accusative)
                | (CaseMarking::Unmarked, Case::Accusative)
        )
    }
}

/// Shorthand for `CaseMarking::of(object).admits(case)`.
pub fn admits(object: &str, case: Case) -> bool {
    CaseMarking::of(object).admits(case)
}
