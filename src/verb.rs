use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::case::{self, Case};
use crate::conjugation::ConjugationError;

// ----------------- Subject -----------------

/// The nine present-tense subject slots, keyed by their data spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Subject {
    #[serde(rename = "ich")]
    Ich,
    #[serde(rename = "du")]
    Du,
    #[serde(rename = "er")]
    Er,
    #[serde(rename = "sie")]
    Sie,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "wir")]
    Wir,
    #[serde(rename = "ihr")]
    Ihr,
    #[serde(rename = "Sie")]
    Formal,
    #[serde(rename = "sie_plural")]
    SiePlural,
}

impl Subject {
    pub const ALL: [Subject; 9] = [
        Subject::Ich,
        Subject::Du,
        Subject::Er,
        Subject::Sie,
        Subject::Es,
        Subject::Wir,
        Subject::Ihr,
        Subject::Formal,
        Subject::SiePlural,
    ];

    /// Exact, case-sensitive: `sie` and `Sie` are different slots.
    pub fn parse(value: &str) -> Option<Subject> {
        Self::ALL.into_iter().find(|s| s.key() == value)
    }

    /// Spelling used in data files and on the consumer API.
    pub fn key(&self) -> &'static str {
        match self {
            Subject::Ich => "ich",
            Subject::Du => "du",
            Subject::Er => "er",
            Subject::Sie => "sie",
            Subject::Es => "es",
            Subject::Wir => "wir",
            Subject::Ihr => "ihr",
            Subject::Formal => "Sie",
            Subject::SiePlural => "sie_plural",
        }
    }

    /// Spelling used inside a sentence.
    pub fn pronoun(&self) -> &'static str {
        match self {
            Subject::SiePlural => "sie",
            other => other.key(),
        }
    }

    /// Spelling shown to a learner. Keeps the three `sie` slots apart, since
    /// each takes a different verb form.
    pub fn hint_label(&self) -> &'static str {
        match self {
            Subject::Formal => "Sie (formell)",
            Subject::SiePlural => "sie (Plural)",
            other => other.key(),
        }
    }

    /// du/er/sie/es: the slots where stem-vowel changes and the `-st`/`-t`
    /// endings live, and the only slots `irregular_present` may override.
    pub fn is_override_slot(&self) -> bool {
        matches!(self, Subject::Du | Subject::Er | Subject::Sie | Subject::Es)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subject {
    type Err = ConjugationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::parse(s).ok_or_else(|| ConjugationError::UnknownSubject(s.to_string()))
    }
}

// ----------------- Verb properties -----------------

/// Case of the *direct* object. A governed preposition is declared
/// separately and never changes this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Valency {
    #[default]
    None,
    Dative,
    Accusative,
}

impl Valency {
    pub fn case(self) -> Option<Case> {
        match self {
            Valency::None => None,
            Valency::Dative => Some(Case::Dative),
            Valency::Accusative => Some(Case::Accusative),
        }
    }

    /// `none`/`null` or any spelling accepted by [`Case::parse`].
    pub fn parse(value: &str) -> Option<Valency> {
        match value.trim().to_lowercase().as_str() {
            "none" | "null" | "" => Some(Valency::None),
            other => Case::parse(other).map(Valency::from),
        }
    }
}

impl From<Case> for Valency {
    fn from(case: Case) -> Self {
        match case {
            Case::Dative => Valency::Dative,
            Case::Accusative => Valency::Accusative,
        }
    }
}

impl fmt::Display for Valency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.case() {
            Some(case) => write!(f, "{case}"),
            None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Auxiliary {
    #[default]
    Haben,
    Sein,
}

impl Auxiliary {
    pub fn parse(value: &str) -> Option<Auxiliary> {
        match value.trim() {
            "haben" => Some(Auxiliary::Haben),
            "sein" => Some(Auxiliary::Sein),
            _ => None,
        }
    }
}

/// Frozen verbs are never generated freely; only their fixed examples are
/// shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Free,
    Frozen,
}

impl GenerationMode {
    pub fn parse(value: &str) -> Option<GenerationMode> {
        match value.trim() {
            "free" => Some(GenerationMode::Free),
            "frozen" => Some(GenerationMode::Frozen),
            _ => None,
        }
    }
}

pub const MIN_FIXED_EXAMPLES: usize = 3;

// ----------------- Error Types -----------------

fn join_cases(cases: &[Case]) -> String {
    cases.iter().map(Case::to_string).collect::<Vec<_>>().join(" or ")
}

/// A verb record that violates a load-time invariant. Always names the
/// verb and, through [`VerbValidationError::field`], the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerbValidationError {
    #[error("verb '{verb}': field '{field}' must not be empty")]
    EmptyField { verb: String, field: &'static str },

    #[error("verb '{verb}': valency is {valency} but 'allowed_objects' is empty")]
    MissingObjects { verb: String, valency: Valency },

    #[error("verb '{verb}': object '{object}' in 'allowed_objects' is not {}", join_cases(.expected))]
    ObjectCaseMismatch {
        verb: String,
        object: String,
        expected: Vec<Case>,
    },

    #[error("verb '{verb}': 'allowed_objects' declared but valency is none")]
    ObjectsWithoutValency { verb: String },

    #[error("verb '{verb}': preposition '{preposition}' declared but 'allowed_prepositional_objects' is empty")]
    MissingPrepositionalObjects { verb: String, preposition: String },

    #[error("verb '{verb}': 'allowed_prepositional_objects' declared without a preposition")]
    PrepositionalObjectsWithoutPreposition { verb: String },

    #[error("verb '{verb}': prepositional object '{object}' repeats the preposition '{preposition}'")]
    PrepositionRepeated {
        verb: String,
        object: String,
        preposition: String,
    },

    #[error("verb '{verb}': 'required_objects' declared but valency is none")]
    RequiredObjectsWithoutValency { verb: String },

    #[error("verb '{verb}': valency {valency} is not listed in 'required_objects'")]
    ValencyNotRequired { verb: String, valency: Valency },

    #[error("verb '{verb}': required {case} object has no entry in 'allowed_objects'")]
    RequiredCaseUnfilled { verb: String, case: Case },

    #[error("verb '{verb}': 'irregular_present' may only override du/er/sie/es, found '{subject}'")]
    OverrideSlot { verb: String, subject: Subject },

    #[error("verb '{verb}': infinitive does not start with separable prefix '{prefix}'")]
    PrefixMismatch { verb: String, prefix: String },

    #[error("verb '{verb}': frozen verbs need at least {} 'fixed_examples', found {count}", MIN_FIXED_EXAMPLES)]
    FixedExamplesMissing { verb: String, count: usize },

    #[error("verb '{0}' is declared more than once")]
    DuplicateInfinitive(String),

    #[error("{} verb record violations:\n{}", .0.len(), .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    MultipleErrors(Vec<VerbValidationError>),
}

impl VerbValidationError {
    /// The field a single violation points at. `None` for duplicates and
    /// aggregated errors.
    pub fn field(&self) -> Option<&'static str> {
        use VerbValidationError::*;
        match self {
            EmptyField { field, .. } => Some(*field),
            MissingObjects { .. }
            | ObjectCaseMismatch { .. }
            | ObjectsWithoutValency { .. }
            | RequiredCaseUnfilled { .. } => Some("allowed_objects"),
            MissingPrepositionalObjects { .. }
            | PrepositionalObjectsWithoutPreposition { .. }
            | PrepositionRepeated { .. } => Some("allowed_prepositional_objects"),
            RequiredObjectsWithoutValency { .. } | ValencyNotRequired { .. } => {
                Some("required_objects")
            }
            OverrideSlot { .. } => Some("irregular_present"),
            PrefixMismatch { .. } => Some("separable_prefix"),
            FixedExamplesMissing { .. } => Some("fixed_examples"),
            DuplicateInfinitive(_) | MultipleErrors(_) => None,
        }
    }

    /// Folds collected violations: nothing, a single error, or
    /// `MultipleErrors` with nested aggregates flattened.
    pub fn collect(errors: Vec<VerbValidationError>) -> Result<(), VerbValidationError> {
        let mut flat = Vec::with_capacity(errors.len());
        for error in errors {
            match error {
                VerbValidationError::MultipleErrors(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        if flat.is_empty() {
            Ok(())
        } else if flat.len() == 1 {
            Err(flat.remove(0))
        } else {
            Err(VerbValidationError::MultipleErrors(flat))
        }
    }
}

// ----------------- Verb entry (unvalidated) -----------------

/// One verb as declared in data, before validation.
#[derive(Debug, Clone, Default)]
pub struct VerbEntry {
    pub infinitive: String,
    pub stem: String,
    pub separable_prefix: Option<String>,
    pub reflexive: bool,
    pub impersonal: bool,
    pub preposition: Option<String>,
    pub valency: Valency,
    pub allowed_objects: Vec<String>,
    pub allowed_prepositional_objects: Vec<String>,
    pub required_objects: BTreeSet<Case>,
    pub irregular_present: BTreeMap<Subject, String>,
    /// Regular endings starting with a consonant take a linking `e`.
    pub epenthesis: bool,
    pub auxiliary: Auxiliary,
    pub partizip_ii: Option<String>,
    pub levels: Vec<String>,
    pub english_meaning: Option<String>,
    pub generation_mode: GenerationMode,
    pub fixed_examples: Vec<String>,
}

impl VerbEntry {
    pub fn new(infinitive: impl Into<String>, stem: impl Into<String>) -> Self {
        Self {
            infinitive: infinitive.into(),
            stem: stem.into(),
            ..Default::default()
        }
    }

    /// Checks every invariant and reports all violations at once.
    pub fn validate(self) -> Result<VerbRecord, VerbValidationError> {
        VerbValidationError::collect(self.violations())?;
        Ok(VerbRecord { entry: self })
    }

    fn violations(&self) -> Vec<VerbValidationError> {
        let verb = || self.infinitive.clone();
        let mut errors = Vec::new();

        if self.infinitive.trim().is_empty() {
            errors.push(VerbValidationError::EmptyField { verb: verb(), field: "infinitive" });
        }
        if self.stem.trim().is_empty() {
            errors.push(VerbValidationError::EmptyField { verb: verb(), field: "stem" });
        }

        // Direct objects
        match self.valency.case() {
            Some(valency_case) => {
                if self.allowed_objects.is_empty() {
                    errors.push(VerbValidationError::MissingObjects {
                        verb: verb(),
                        valency: self.valency,
                    });
                }

                let expected: Vec<Case> = if self.required_objects.is_empty() {
                    vec![valency_case]
                } else {
                    self.required_objects.iter().copied().collect()
                };
                for object in &self.allowed_objects {
                    if !expected.iter().any(|c| case::admits(object, *c)) {
                        errors.push(VerbValidationError::ObjectCaseMismatch {
                            verb: verb(),
                            object: object.clone(),
                            expected: expected.clone(),
                        });
                    }
                }

                if !self.required_objects.is_empty()
                    && !self.required_objects.contains(&valency_case)
                {
                    errors.push(VerbValidationError::ValencyNotRequired {
                        verb: verb(),
                        valency: self.valency,
                    });
                }
            }
            None => {
                if !self.allowed_objects.is_empty() {
                    errors.push(VerbValidationError::ObjectsWithoutValency { verb: verb() });
                }
                if !self.required_objects.is_empty() {
                    errors.push(VerbValidationError::RequiredObjectsWithoutValency { verb: verb() });
                }
            }
        }

        for required in &self.required_objects {
            if !self.allowed_objects.iter().any(|o| case::admits(o, *required)) {
                errors.push(VerbValidationError::RequiredCaseUnfilled {
                    verb: verb(),
                    case: *required,
                });
            }
        }

        // Prepositional objects
        match &self.preposition {
            Some(preposition) if preposition.trim().is_empty() => {
                errors.push(VerbValidationError::EmptyField { verb: verb(), field: "preposition" });
            }
            Some(preposition) => {
                if self.allowed_prepositional_objects.is_empty() {
                    errors.push(VerbValidationError::MissingPrepositionalObjects {
                        verb: verb(),
                        preposition: preposition.clone(),
                    });
                }
                for object in &self.allowed_prepositional_objects {
                    let first = object.split_whitespace().next().unwrap_or_default();
                    if first.eq_ignore_ascii_case(preposition.trim()) {
                        errors.push(VerbValidationError::PrepositionRepeated {
                            verb: verb(),
                            object: object.clone(),
                            preposition: preposition.clone(),
                        });
                    }
                }
            }
            None => {
                if !self.allowed_prepositional_objects.is_empty() {
                    errors.push(VerbValidationError::PrepositionalObjectsWithoutPreposition {
                        verb: verb(),
                    });
                }
            }
        }

        for (subject, form) in &self.irregular_present {
            if !subject.is_override_slot() {
                errors.push(VerbValidationError::OverrideSlot { verb: verb(), subject: *subject });
            } else if form.trim().is_empty() {
                errors.push(VerbValidationError::EmptyField {
                    verb: verb(),
                    field: "irregular_present",
                });
            }
        }

        if let Some(prefix) = &self.separable_prefix {
            let base = self.infinitive.strip_prefix("sich ").unwrap_or(&self.infinitive);
            if prefix.trim().is_empty() {
                errors.push(VerbValidationError::EmptyField {
                    verb: verb(),
                    field: "separable_prefix",
                });
            } else if !base.starts_with(prefix.as_str()) {
                errors.push(VerbValidationError::PrefixMismatch {
                    verb: verb(),
                    prefix: prefix.clone(),
                });
            }
        }

        if self.generation_mode == GenerationMode::Frozen
            && self.fixed_examples.len() < MIN_FIXED_EXAMPLES
        {
            errors.push(VerbValidationError::FixedExamplesMissing {
                verb: verb(),
                count: self.fixed_examples.len(),
            });
        }

        errors
    }
}

// ----------------- Verb record (validated) -----------------

/// A verb that passed validation. Read-only for the rest of its life.
#[derive(Debug, Clone)]
pub struct VerbRecord {
    entry: VerbEntry,
}

impl VerbRecord {
    pub fn infinitive(&self) -> &str {
        &self.entry.infinitive
    }

    pub fn stem(&self) -> &str {
        &self.entry.stem
    }

    pub fn separable_prefix(&self) -> Option<&str> {
        self.entry.separable_prefix.as_deref()
    }

    pub fn is_separable(&self) -> bool {
        self.entry.separable_prefix.is_some()
    }

    pub fn is_reflexive(&self) -> bool {
        self.entry.reflexive
    }

    pub fn is_impersonal(&self) -> bool {
        self.entry.impersonal
    }

    pub fn preposition(&self) -> Option<&str> {
        self.entry.preposition.as_deref()
    }

    pub fn valency(&self) -> Valency {
        self.entry.valency
    }

    pub fn allowed_objects(&self) -> &[String] {
        &self.entry.allowed_objects
    }

    pub fn allowed_prepositional_objects(&self) -> &[String] {
        &self.entry.allowed_prepositional_objects
    }

    pub fn required_objects(&self) -> &BTreeSet<Case> {
        &self.entry.required_objects
    }

    pub fn is_ditransitive(&self) -> bool {
        self.entry.required_objects.contains(&Case::Dative)
            && self.entry.required_objects.contains(&Case::Accusative)
    }

    /// Allowed objects whose marking admits `case`, in declaration order.
    pub fn objects_admitting(&self, case: Case) -> impl Iterator<Item = &str> + '_ {
        self.entry
            .allowed_objects
            .iter()
            .map(String::as_str)
            .filter(move |o| case::admits(o, case))
    }

    pub fn irregular_present(&self, subject: Subject) -> Option<&str> {
        self.entry.irregular_present.get(&subject).map(String::as_str)
    }

    pub fn has_epenthesis(&self) -> bool {
        self.entry.epenthesis
    }

    pub fn auxiliary(&self) -> Auxiliary {
        self.entry.auxiliary
    }

    pub fn partizip_ii(&self) -> Option<&str> {
        self.entry.partizip_ii.as_deref()
    }

    pub fn levels(&self) -> &[String] {
        &self.entry.levels
    }

    pub fn is_at_level(&self, level: &str) -> bool {
        self.entry.levels.iter().any(|l| l == level)
    }

    pub fn english_meaning(&self) -> Option<&str> {
        self.entry.english_meaning.as_deref()
    }

    pub fn generation_mode(&self) -> GenerationMode {
        self.entry.generation_mode
    }

    pub fn is_frozen(&self) -> bool {
        self.entry.generation_mode == GenerationMode::Frozen
    }

    pub fn fixed_examples(&self) -> &[String] {
        &self.entry.fixed_examples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn essen() -> VerbEntry {
        let mut entry = VerbEntry::new("essen", "ess");
        entry.valency = Valency::Accusative;
        entry.allowed_objects = vec!["das Brot".into(), "einen Apfel".into()];
        entry.irregular_present.insert(Subject::Du, "isst".into());
        entry.irregular_present.insert(Subject::Er, "isst".into());
        entry
    }

    #[test]
    fn test_subject_parse_is_case_sensitive() {
        assert_eq!(Subject::parse("sie"), Some(Subject::Sie));
        assert_eq!(Subject::parse("Sie"), Some(Subject::Formal));
        assert_eq!(Subject::parse("sie_plural"), Some(Subject::SiePlural));
        assert_eq!(Subject::parse("Ich"), None);
        assert_eq!(Subject::parse(" du "), None);
        assert_eq!(Subject::parse("du\n"), None);
        assert!("man".parse::<Subject>().is_err());
    }

    #[test]
    fn test_sie_plural_renders_as_sie() {
        assert_eq!(Subject::SiePlural.pronoun(), "sie");
        assert_eq!(Subject::SiePlural.key(), "sie_plural");
    }

    #[test]
    fn test_hint_labels_tell_the_sie_slots_apart() {
        let labels: BTreeSet<&str> = [Subject::Sie, Subject::Formal, Subject::SiePlural]
            .iter()
            .map(Subject::hint_label)
            .collect();
        assert_eq!(labels.len(), 3);
        assert_eq!(Subject::Sie.hint_label(), "sie");
        assert_eq!(Subject::Ich.hint_label(), "ich");
    }

    #[test]
    fn test_valency_parse() {
        assert_eq!(Valency::parse("akk"), Some(Valency::Accusative));
        assert_eq!(Valency::parse("dat"), Some(Valency::Dative));
        assert_eq!(Valency::parse("none"), Some(Valency::None));
        assert_eq!(Valency::parse("genitiv"), None);
    }

    #[test]
    fn test_valid_entry_passes() {
        let record = essen().validate().unwrap();
        assert_eq!(record.infinitive(), "essen");
        assert_eq!(record.irregular_present(Subject::Du), Some("isst"));
        assert!(!record.is_ditransitive());
    }

    #[test]
    fn test_valency_without_objects_is_rejected() {
        let mut entry = essen();
        entry.allowed_objects.clear();
        let err = entry.validate().unwrap_err();
        assert_eq!(err.field(), Some("allowed_objects"));
        assert!(matches!(err, VerbValidationError::MissingObjects { .. }));
    }

    #[test]
    fn test_object_in_wrong_case_is_rejected() {
        let mut entry = essen();
        entry.allowed_objects.push("dem Kind".into());
        let err = entry.validate().unwrap_err();
        assert_eq!(
            err,
            VerbValidationError::ObjectCaseMismatch {
                verb: "essen".into(),
                object: "dem Kind".into(),
                expected: vec![Case::Accusative],
            }
        );
        assert!(err.to_string().contains("dem Kind"));
    }

    #[test]
    fn test_preposition_requires_its_own_objects() {
        let mut entry = VerbEntry::new("warten", "wart");
        entry.preposition = Some("auf".into());
        let err = entry.validate().unwrap_err();
        assert_eq!(err.field(), Some("allowed_prepositional_objects"));
    }

    #[test]
    fn test_prepositional_object_must_not_repeat_preposition() {
        let mut entry = VerbEntry::new("warten", "wart");
        entry.preposition = Some("auf".into());
        entry.allowed_prepositional_objects = vec!["auf den Bus".into()];
        assert!(matches!(
            entry.validate(),
            Err(VerbValidationError::PrepositionRepeated { .. })
        ));
    }

    #[test]
    fn test_required_case_must_be_fillable() {
        let mut entry = VerbEntry::new("geben", "geb");
        entry.valency = Valency::Accusative;
        entry.required_objects = [Case::Dative, Case::Accusative].into_iter().collect();
        entry.allowed_objects = vec!["das Buch".into()];
        let err = entry.validate().unwrap_err();
        assert_eq!(
            err,
            VerbValidationError::RequiredCaseUnfilled { verb: "geben".into(), case: Case::Dative }
        );
    }

    #[test]
    fn test_ditransitive_objects_may_mix_cases() {
        let mut entry = VerbEntry::new("geben", "geb");
        entry.valency = Valency::Accusative;
        entry.required_objects = [Case::Dative, Case::Accusative].into_iter().collect();
        entry.allowed_objects = vec!["dem Freund".into(), "das Buch".into()];
        let record = entry.validate().unwrap();
        assert!(record.is_ditransitive());
        assert_eq!(record.objects_admitting(Case::Dative).collect::<Vec<_>>(), ["dem Freund"]);
    }

    #[test]
    fn test_override_outside_singular_slot_is_rejected() {
        let mut entry = essen();
        entry.irregular_present.insert(Subject::Wir, "essen".into());
        let err = entry.validate().unwrap_err();
        assert_eq!(err.field(), Some("irregular_present"));
    }

    #[test]
    fn test_prefix_must_match_infinitive() {
        let mut entry = VerbEntry::new("sich anziehen", "zieh");
        entry.reflexive = true;
        entry.separable_prefix = Some("an".into());
        assert!(entry.clone().validate().is_ok());

        entry.separable_prefix = Some("aus".into());
        assert_eq!(entry.validate().unwrap_err().field(), Some("separable_prefix"));
    }

    #[test]
    fn test_all_violations_are_reported() {
        let mut entry = VerbEntry::new("kaputt", "");
        entry.allowed_prepositional_objects = vec!["den Bus".into()];
        match entry.validate() {
            Err(VerbValidationError::MultipleErrors(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected MultipleErrors, got {other:?}"),
        }
    }

    #[test]
    fn test_frozen_verb_needs_fixed_examples() {
        let mut entry = VerbEntry::new("gefallen", "gefall");
        entry.generation_mode = GenerationMode::Frozen;
        entry.fixed_examples = vec!["Das Buch gefällt mir.".into()];
        assert_eq!(
            entry.validate().unwrap_err(),
            VerbValidationError::FixedExamplesMissing { verb: "gefallen".into(), count: 1 }
        );
    }
}
