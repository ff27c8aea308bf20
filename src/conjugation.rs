//! Present-tense conjugation.
//!
//! Forms come from three places, consulted in this order:
//!
//! 1. the verb's own `irregular_present` overrides (du/er/sie/es only),
//! 2. a closed table of auxiliary and modal paradigms,
//! 3. stem + regular ending.
//!
//! Nothing is inferred from the shape of the stem except the single
//! sibilant rule for `du` (`sitz` + `t`, not `sitz` + `st`). Stem-vowel
//! changes exist only where data or the table spells them out.

use thiserror::Error;
use tracing::trace;

use crate::verb::{Subject, VerbRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConjugationError {
    #[error("Unknown subject pronoun '{0}'")]
    UnknownSubject(String),

    #[error("Verb '{0}' has an empty stem")]
    EmptyStem(String),
}

// Stems ending in any of these take `-t` instead of `-st` after `du`.
const SIBILANT_ENDINGS: [&str; 5] = ["s", "ß", "z", "tz", "x"];

/// Auxiliaries and modals whose present paradigm cannot be derived from a
/// stem. Lists only the slots that deviate from stem + ending.
fn closed_form(infinitive: &str, subject: Subject) -> Option<&'static str> {
    use Subject::*;

    let form = match (infinitive, subject) {
        ("sein", Ich) => "bin",
        ("sein", Du) => "bist",
        ("sein", Er | Sie | Es) => "ist",
        ("sein", Wir | Formal | SiePlural) => "sind",
        ("sein", Ihr) => "seid",

        ("haben", Du) => "hast",
        ("haben", Er | Sie | Es) => "hat",

        ("werden", Du) => "wirst",
        ("werden", Er | Sie | Es) => "wird",
        ("werden", Ihr) => "werdet",

        ("wissen", Ich | Er | Sie | Es) => "weiß",
        ("wissen", Du) => "weißt",

        ("können", Ich | Er | Sie | Es) => "kann",
        ("können", Du) => "kannst",

        ("müssen", Ich | Er | Sie | Es) => "muss",
        ("müssen", Du) => "musst",

        ("dürfen", Ich | Er | Sie | Es) => "darf",
        ("dürfen", Du) => "darfst",

        ("sollen", Ich | Er | Sie | Es) => "soll",
        ("sollen", Du) => "sollst",

        ("wollen", Ich | Er | Sie | Es) => "will",
        ("wollen", Du) => "willst",

        ("mögen", Ich | Er | Sie | Es) => "mag",
        ("mögen", Du) => "magst",

        _ => return None,
    };
    Some(form)
}

/// True for the infinitives the closed paradigm table knows about.
pub fn has_closed_paradigm(infinitive: &str) -> bool {
    closed_form(infinitive, Subject::Du).is_some()
}

fn regular_ending(verb: &VerbRecord, subject: Subject) -> &'static str {
    let epenthesis = verb.has_epenthesis();

    match subject {
        Subject::Ich => "e",
        Subject::Wir | Subject::Formal | Subject::SiePlural => "en",
        Subject::Ihr if epenthesis => "et",
        Subject::Ihr => "t",
        Subject::Du if epenthesis => "est",
        Subject::Du if ends_in_sibilant(verb.stem()) => "t",
        Subject::Du => "st",
        Subject::Er | Subject::Sie | Subject::Es if epenthesis => "et",
        Subject::Er | Subject::Sie | Subject::Es => "t",
    }
}

fn ends_in_sibilant(stem: &str) -> bool {
    SIBILANT_ENDINGS.iter().any(|ending| stem.ends_with(ending))
}

/// Resolves finite present-tense forms. Stateless; one value can be
/// shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conjugator;

impl Conjugator {
    pub fn new() -> Self {
        Self
    }

    /// Conjugates for a subject given by its data spelling (`"du"`,
    /// `"sie_plural"`, ...).
    pub fn resolve(&self, verb: &VerbRecord, subject: &str) -> Result<String, ConjugationError> {
        let subject: Subject = subject.parse()?;
        self.conjugate(verb, subject)
    }

    pub fn conjugate(&self, verb: &VerbRecord, subject: Subject) -> Result<String, ConjugationError> {
        if verb.stem().is_empty() {
            return Err(ConjugationError::EmptyStem(verb.infinitive().to_string()));
        }

        if let Some(form) = verb.irregular_present(subject) {
            trace!(verb = verb.infinitive(), %subject, form, "irregular_present override");
            return Ok(form.to_string());
        }

        if let Some(form) = closed_form(verb.infinitive(), subject) {
            trace!(verb = verb.infinitive(), %subject, form, "closed paradigm");
            return Ok(form.to_string());
        }

        Ok(format!("{}{}", verb.stem(), regular_ending(verb, subject)))
    }
}

/// Shorthand for [`Conjugator::resolve`].
pub fn resolve(verb: &VerbRecord, subject: &str) -> Result<String, ConjugationError> {
    Conjugator.resolve(verb, subject)
}
