use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::case::{self, Case};
use crate::templates::SentenceTemplate;
use crate::verb::{Valency, VerbRecord};

/// Why a verb cannot fill a template. Expected during matching, never an
/// error by itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Incompatibility {
    FrozenVerb,
    /// The template has an object slot, the verb has no direct object.
    NoDirectObject,
    NoObjectFillers,
    NoPreposition,
    NoPrepositionalFillers,
    RequiredCaseUnfilled { case: Case },
    /// The verb's objects are obligatory, the template has no object slot.
    ObligatoryObjectsOmitted,
    /// An impersonal verb in a template that allows personal subjects.
    ImpersonalSubjectRequired,
    /// A personal verb in a template restricted to `es`.
    ImpersonalTemplate,
    ObjectCaseMismatch { required: Case, declared: Valency },
    ReflexiveMismatch { required: bool },
    SeparableMismatch { required: bool },
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incompatibility::FrozenVerb => write!(f, "verb is frozen"),
            Incompatibility::NoDirectObject => write!(f, "template needs an object, verb has valency none"),
            Incompatibility::NoObjectFillers => write!(f, "verb declares no allowed objects"),
            Incompatibility::NoPreposition => {
                write!(f, "template needs a prepositional object, verb governs no preposition")
            }
            Incompatibility::NoPrepositionalFillers => {
                write!(f, "verb declares no allowed prepositional objects")
            }
            Incompatibility::RequiredCaseUnfilled { case } => {
                write!(f, "no allowed object for the required {case} slot")
            }
            Incompatibility::ObligatoryObjectsOmitted => {
                write!(f, "verb requires its objects, template has no object slot")
            }
            Incompatibility::ImpersonalSubjectRequired => {
                write!(f, "impersonal verb needs a template restricted to 'es'")
            }
            Incompatibility::ImpersonalTemplate => {
                write!(f, "template is restricted to 'es', verb is not impersonal")
            }
            Incompatibility::ObjectCaseMismatch { required, declared } => {
                write!(f, "template wants a {required} object, verb valency is {declared}")
            }
            Incompatibility::ReflexiveMismatch { required } => {
                write!(f, "template requires reflexive = {required}")
            }
            Incompatibility::SeparableMismatch { required } => {
                write!(f, "template requires separable = {required}")
            }
        }
    }
}

/// Checks a verb's declared grammar against a template's slots.
///
/// The direct-object case (`valency`) and the governed preposition are
/// checked independently; a template asking for a dative object is never
/// satisfied by a dative-governing preposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValencyValidator;

impl ValencyValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn is_compatible(&self, verb: &VerbRecord, template: &SentenceTemplate) -> bool {
        self.missing_requirements(verb, template).is_empty()
    }

    pub fn missing_requirements(
        &self,
        verb: &VerbRecord,
        template: &SentenceTemplate,
    ) -> BTreeSet<Incompatibility> {
        let mut missing = BTreeSet::new();

        if verb.is_frozen() {
            missing.insert(Incompatibility::FrozenVerb);
        }

        if template.requires_object {
            if verb.valency() == Valency::None {
                missing.insert(Incompatibility::NoDirectObject);
            }
            if verb.allowed_objects().is_empty() {
                missing.insert(Incompatibility::NoObjectFillers);
            }
        }

        if template.requires_prepositional_object {
            if verb.preposition().is_none() {
                missing.insert(Incompatibility::NoPreposition);
            }
            if verb.allowed_prepositional_objects().is_empty() {
                missing.insert(Incompatibility::NoPrepositionalFillers);
            }
        }

        if !verb.required_objects().is_empty() {
            for required in verb.required_objects() {
                let fillable = verb
                    .allowed_objects()
                    .iter()
                    .any(|o| case::admits(o, *required));
                if !fillable {
                    missing.insert(Incompatibility::RequiredCaseUnfilled { case: *required });
                }
            }
            if !template.requires_object {
                missing.insert(Incompatibility::ObligatoryObjectsOmitted);
            }
        }

        if verb.is_impersonal() && !template.is_impersonal() {
            missing.insert(Incompatibility::ImpersonalSubjectRequired);
        }
        if !verb.is_impersonal() && template.is_impersonal() {
            missing.insert(Incompatibility::ImpersonalTemplate);
        }

        if let Some(required) = template.object_case {
            if verb.valency().case() != Some(required) {
                missing.insert(Incompatibility::ObjectCaseMismatch {
                    required,
                    declared: verb.valency(),
                });
            }
        }

        if let Some(required) = template.reflexive {
            if verb.is_reflexive() != required {
                missing.insert(Incompatibility::ReflexiveMismatch { required });
            }
        }
        if let Some(required) = template.separable {
            if verb.is_separable() != required {
                missing.insert(Incompatibility::SeparableMismatch { required });
            }
        }

        missing
    }
}

/// Shorthand for [`ValencyValidator::is_compatible`].
pub fn is_compatible(verb: &VerbRecord, template: &SentenceTemplate) -> bool {
    ValencyValidator.is_compatible(verb, template)
}

/// Shorthand for [`ValencyValidator::missing_requirements`].
pub fn missing_requirements(
    verb: &VerbRecord,
    template: &SentenceTemplate,
) -> BTreeSet<Incompatibility> {
    ValencyValidator.missing_requirements(verb, template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verb::{GenerationMode, Subject, VerbEntry};

    fn template(id: &str) -> SentenceTemplate {
        SentenceTemplate::new(id, Subject::ALL.iter().copied().filter(|s| *s != Subject::Es))
    }

    fn warten() -> VerbRecord {
        let mut entry = VerbEntry::new("warten", "wart");
        entry.epenthesis = true;
        entry.preposition = Some("auf".into());
        entry.allowed_prepositional_objects = vec!["den Bus".into()];
        entry.validate().unwrap()
    }

    fn helfen() -> VerbRecord {
        let mut entry = VerbEntry::new("helfen", "helf");
        entry.valency = Valency::Dative;
        entry.allowed_objects = vec!["dem Kind".into(), "meiner Freundin".into()];
        entry.validate().unwrap()
    }

    fn geben() -> VerbRecord {
        let mut entry = VerbEntry::new("geben", "geb");
        entry.valency = Valency::Accusative;
        entry.required_objects = [Case::Dative, Case::Accusative].into_iter().collect();
        entry.allowed_objects = vec!["dem Freund".into(), "das Buch".into()];
        entry.validate().unwrap()
    }

    #[test]
    fn test_bare_template_accepts_plain_verbs() {
        let t = template("einfach");
        assert!(is_compatible(&warten(), &t));
        assert!(is_compatible(&helfen(), &t));
    }

    #[test]
    fn test_object_slot_needs_valency() {
        let mut t = template("objekt");
        t.requires_object = true;
        assert!(is_compatible(&helfen(), &t));
        assert_eq!(
            missing_requirements(&warten(), &t),
            [Incompatibility::NoDirectObject, Incompatibility::NoObjectFillers]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn test_prepositional_slot_needs_preposition() {
        let mut t = template("praeposition");
        t.requires_prepositional_object = true;
        assert!(is_compatible(&warten(), &t));
        assert!(missing_requirements(&helfen(), &t).contains(&Incompatibility::NoPreposition));
    }

    #[test]
    fn test_preposition_case_never_counts_as_valency() {
        // "auf den Bus" is accusative, but warten has no direct object
        let mut t = template("akkusativ");
        t.requires_object = true;
        t.object_case = Some(Case::Accusative);
        let missing = missing_requirements(&warten(), &t);
        assert!(missing.contains(&Incompatibility::ObjectCaseMismatch {
            required: Case::Accusative,
            declared: Valency::None,
        }));
    }

    #[test]
    fn test_object_case_must_match_valency() {
        let mut t = template("akkusativ");
        t.requires_object = true;
        t.object_case = Some(Case::Accusative);
        assert!(!is_compatible(&helfen(), &t));
        t.object_case = Some(Case::Dative);
        assert!(is_compatible(&helfen(), &t));
    }

    #[test]
    fn test_ditransitive_objects_are_obligatory() {
        let t = template("einfach");
        assert_eq!(
            missing_requirements(&geben(), &t),
            [Incompatibility::ObligatoryObjectsOmitted].into_iter().collect()
        );
        let mut with_object = template("objekt");
        with_object.requires_object = true;
        assert!(is_compatible(&geben(), &with_object));
    }

    #[test]
    fn test_impersonal_verbs_need_es_templates() {
        let mut entry = VerbEntry::new("regnen", "regn");
        entry.impersonal = true;
        entry.epenthesis = true;
        let regnen = entry.validate().unwrap();

        let personal = template("einfach");
        let impersonal = SentenceTemplate::new("wetter", [Subject::Es]);

        assert!(missing_requirements(&regnen, &personal)
            .contains(&Incompatibility::ImpersonalSubjectRequired));
        assert!(is_compatible(&regnen, &impersonal));
        assert!(missing_requirements(&warten(), &impersonal)
            .contains(&Incompatibility::ImpersonalTemplate));
    }

    #[test]
    fn test_structural_flags() {
        let mut t = template("reflexiv");
        t.reflexive = Some(true);
        assert_eq!(
            missing_requirements(&warten(), &t),
            [Incompatibility::ReflexiveMismatch { required: true }].into_iter().collect()
        );

        let mut t = template("trennbar");
        t.separable = Some(false);
        assert!(is_compatible(&warten(), &t));
    }

    #[test]
    fn test_frozen_verbs_match_nothing() {
        let mut entry = VerbEntry::new("kosten", "kost");
        entry.generation_mode = GenerationMode::Frozen;
        entry.fixed_examples = vec!["a".into(), "b".into(), "c".into()];
        let kosten = entry.validate().unwrap();
        assert!(missing_requirements(&kosten, &template("einfach"))
            .contains(&Incompatibility::FrozenVerb));
    }
}
