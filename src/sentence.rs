use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::case::{self, Case};
use crate::conjugation::{ConjugationError, Conjugator};
use crate::templates::SentenceTemplate;
use crate::utility::capitalize_first;
use crate::valency::{Incompatibility, ValencyValidator};
use crate::verb::{Subject, Valency, VerbRecord};

// ----------------- Error Types -----------------

fn join<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(T::to_string).collect::<Vec<_>>().join("; ")
}

/// A caller handed the constructor something it should have ruled out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("verb '{verb}' cannot fill template '{template}': {}", join(.reasons))]
    Incompatible {
        verb: String,
        template: String,
        reasons: Vec<Incompatibility>,
    },

    #[error("verb '{0}' is frozen and only has fixed examples")]
    FrozenVerb(String),

    #[error("template '{template}' does not allow subject '{subject}'")]
    SubjectNotInTemplate { template: String, subject: Subject },

    #[error("verb '{verb}' is impersonal, subject must be 'es' (got '{subject}')")]
    ImpersonalSubject { verb: String, subject: Subject },

    #[error("verb '{verb}': no filler given for the {slot} slot")]
    MissingFiller { verb: String, slot: &'static str },

    #[error("template '{template}' has no {slot} slot, but a filler was given")]
    UnexpectedFiller { template: String, slot: &'static str },

    #[error("verb '{verb}': '{filler}' is not listed for the {slot} slot")]
    FillerNotAllowed {
        verb: String,
        slot: &'static str,
        filler: String,
    },

    #[error("verb '{verb}' takes {expected} object(s), got {found}")]
    ObjectCount {
        verb: String,
        expected: usize,
        found: usize,
    },

    #[error("verb '{verb}': objects {objects:?} cannot be read as one dative and one accusative")]
    ObjectCasesUnsatisfied { verb: String, objects: Vec<String> },

    #[error("Conjugation failed: {0}")]
    Conjugation(#[from] ConjugationError),
}

const OBJECT_SLOT: &str = "object";
const PREPOSITIONAL_SLOT: &str = "prepositional object";

// ----------------- Inputs -----------------

/// Lexical material for a template's slots. Every entry must come from the
/// verb's own lists; the constructor never invents words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fillers {
    /// One object, or a dative and an accusative object for ditransitive
    /// verbs (in any order).
    pub objects: Vec<String>,
    pub prepositional_object: Option<String>,
}

impl Fillers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.objects.push(object.into());
        self
    }

    pub fn with_prepositional_object(mut self, object: impl Into<String>) -> Self {
        self.prepositional_object = Some(object.into());
        self
    }
}

// ----------------- Output -----------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectUse {
    pub text: String,
    pub case: Case,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflexiveUse {
    pub pronoun: String,
    pub case: Case,
}

/// Which grammatical decision produced each token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceTrace {
    pub template_id: String,
    pub verb: String,
    pub subject: Subject,
    pub finite_form: String,
    pub reflexive: Option<ReflexiveUse>,
    pub objects: Vec<ObjectUse>,
    pub preposition: Option<String>,
    pub prepositional_object: Option<String>,
    pub separable_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceResult {
    /// Phrases in surface order; a multi-word filler stays one token.
    pub tokens: Vec<String>,
    pub trace: SentenceTrace,
}

impl SentenceResult {
    /// `"Du isst das Brot."`
    pub fn text(&self) -> String {
        let mut words = self.tokens.iter();
        let mut out = match words.next() {
            Some(first) => capitalize_first(first),
            None => return String::new(),
        };
        for word in words {
            out.push(' ');
            out.push_str(word);
        }
        out.push('.');
        out
    }
}

impl fmt::Display for SentenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ----------------- Builder -----------------

fn reflexive_pronoun(subject: Subject, case: Case) -> &'static str {
    match (subject, case) {
        (Subject::Ich, Case::Accusative) => "mich",
        (Subject::Ich, Case::Dative) => "mir",
        (Subject::Du, Case::Accusative) => "dich",
        (Subject::Du, Case::Dative) => "dir",
        (Subject::Wir, _) => "uns",
        (Subject::Ihr, _) => "euch",
        _ => "sich",
    }
}

/// Assembles a main clause in V2 order:
/// subject, finite verb, reflexive, objects, prepositional phrase, prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceBuilder {
    conjugator: Conjugator,
    validator: ValencyValidator,
}

impl SentenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(
        &self,
        verb: &VerbRecord,
        template: &SentenceTemplate,
        subject: Subject,
        fillers: &Fillers,
    ) -> Result<SentenceResult, GenerationError> {
        debug!(
            verb = verb.infinitive(),
            template = %template.id,
            %subject,
            "building sentence"
        );

        if verb.is_frozen() {
            return Err(GenerationError::FrozenVerb(verb.infinitive().to_string()));
        }

        let missing = self.validator.missing_requirements(verb, template);
        if !missing.is_empty() {
            return Err(GenerationError::Incompatible {
                verb: verb.infinitive().to_string(),
                template: template.id.clone(),
                reasons: missing.into_iter().collect(),
            });
        }

        if !template.allows_subject(subject) {
            return Err(GenerationError::SubjectNotInTemplate {
                template: template.id.clone(),
                subject,
            });
        }
        if verb.is_impersonal() && subject != Subject::Es {
            return Err(GenerationError::ImpersonalSubject {
                verb: verb.infinitive().to_string(),
                subject,
            });
        }

        let objects = self.place_objects(verb, template, fillers)?;
        let prepositional = self.place_prepositional_object(verb, template, fillers)?;
        let finite_form = self.conjugator.conjugate(verb, subject)?;

        let mut tokens = vec![subject.pronoun().to_string(), finite_form.clone()];

        let reflexive = verb.is_reflexive().then(|| {
            let dative = verb.valency() == Valency::Dative
                && !objects.iter().any(|o| o.case == Case::Accusative);
            let case = if dative { Case::Dative } else { Case::Accusative };
            ReflexiveUse {
                pronoun: reflexive_pronoun(subject, case).to_string(),
                case,
            }
        });
        if let Some(r) = &reflexive {
            tokens.push(r.pronoun.clone());
        }

        tokens.extend(objects.iter().map(|o| o.text.clone()));

        if let Some((preposition, object)) = &prepositional {
            tokens.push(preposition.clone());
            tokens.push(object.clone());
        }

        if let Some(prefix) = verb.separable_prefix() {
            tokens.push(prefix.to_string());
        }

        let (preposition, prepositional_object) = prepositional.unzip();
        let result = SentenceResult {
            tokens,
            trace: SentenceTrace {
                template_id: template.id.clone(),
                verb: verb.infinitive().to_string(),
                subject,
                finite_form,
                reflexive,
                objects,
                preposition,
                prepositional_object,
                separable_prefix: verb.separable_prefix().map(str::to_string),
            },
        };
        debug!(sentence = %result, "sentence built");
        Ok(result)
    }

    fn place_objects(
        &self,
        verb: &VerbRecord,
        template: &SentenceTemplate,
        fillers: &Fillers,
    ) -> Result<Vec<ObjectUse>, GenerationError> {
        if !template.requires_object {
            if !fillers.objects.is_empty() {
                return Err(GenerationError::UnexpectedFiller {
                    template: template.id.clone(),
                    slot: OBJECT_SLOT,
                });
            }
            return Ok(Vec::new());
        }

        let expected = if verb.is_ditransitive() { 2 } else { 1 };
        match fillers.objects.len() {
            0 => {
                return Err(GenerationError::MissingFiller {
                    verb: verb.infinitive().to_string(),
                    slot: OBJECT_SLOT,
                });
            }
            found if found != expected => {
                return Err(GenerationError::ObjectCount {
                    verb: verb.infinitive().to_string(),
                    expected,
                    found,
                });
            }
            _ => {}
        }

        for object in &fillers.objects {
            if !verb.allowed_objects().contains(object) {
                return Err(GenerationError::FillerNotAllowed {
                    verb: verb.infinitive().to_string(),
                    slot: OBJECT_SLOT,
                    filler: object.clone(),
                });
            }
        }

        if !verb.is_ditransitive() {
            let case = verb.valency().case().unwrap_or(Case::Accusative);
            return Ok(vec![ObjectUse {
                text: fillers.objects[0].clone(),
                case,
            }]);
        }

        // dative before accusative, whatever order the caller used
        let (first, second) = (&fillers.objects[0], &fillers.objects[1]);
        let (dative, accusative) =
            if case::admits(first, Case::Dative) && case::admits(second, Case::Accusative) {
                (first, second)
            } else if case::admits(second, Case::Dative) && case::admits(first, Case::Accusative) {
                (second, first)
            } else {
                return Err(GenerationError::ObjectCasesUnsatisfied {
                    verb: verb.infinitive().to_string(),
                    objects: fillers.objects.clone(),
                });
            };

        Ok(vec![
            ObjectUse { text: dative.clone(), case: Case::Dative },
            ObjectUse { text: accusative.clone(), case: Case::Accusative },
        ])
    }

    fn place_prepositional_object(
        &self,
        verb: &VerbRecord,
        template: &SentenceTemplate,
        fillers: &Fillers,
    ) -> Result<Option<(String, String)>, GenerationError> {
        let given = fillers.prepositional_object.as_ref();

        if !template.requires_prepositional_object {
            if given.is_some() {
                return Err(GenerationError::UnexpectedFiller {
                    template: template.id.clone(),
                    slot: PREPOSITIONAL_SLOT,
                });
            }
            return Ok(None);
        }

        let object = given.ok_or_else(|| GenerationError::MissingFiller {
            verb: verb.infinitive().to_string(),
            slot: PREPOSITIONAL_SLOT,
        })?;
        if !verb.allowed_prepositional_objects().contains(object) {
            return Err(GenerationError::FillerNotAllowed {
                verb: verb.infinitive().to_string(),
                slot: PREPOSITIONAL_SLOT,
                filler: object.clone(),
            });
        }

        // compatibility already guarantees a preposition
        let preposition = verb.preposition().unwrap_or_default().to_string();
        Ok(Some((preposition, object.clone())))
    }
}

/// Shorthand for [`SentenceBuilder::build`].
pub fn build(
    verb: &VerbRecord,
    template: &SentenceTemplate,
    subject: Subject,
    fillers: &Fillers,
) -> Result<SentenceResult, GenerationError> {
    SentenceBuilder::new().build(verb, template, subject, fillers)
}
