// src/templates.rs
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use yaml_rust2::{Yaml, YamlLoader};

use crate::case::Case;
use crate::utility::{optional_bool, optional_str, required_str, string_list};
use crate::valency::ValencyValidator;
use crate::verb::{Subject, VerbRecord};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("YAML parse error: {0}")]
    YamlParseError(String),

    #[error("Invalid template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Template '{0}' is declared more than once")]
    DuplicateId(String),

    #[error("File error: {0}")]
    FileError(String),
}

/// What an exercise shows the learner before the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Subject,
    Reflexive,
    Preposition,
    Object,
    PrepositionalObject,
    SeparablePrefix,
}

impl HintKind {
    pub fn parse(value: &str) -> Option<HintKind> {
        match value.trim() {
            "subject" => Some(HintKind::Subject),
            "reflexive" => Some(HintKind::Reflexive),
            "preposition" => Some(HintKind::Preposition),
            "object" => Some(HintKind::Object),
            "prepositional_object" => Some(HintKind::PrepositionalObject),
            "separable_prefix" => Some(HintKind::SeparablePrefix),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HintKind::Subject => "Subjekt",
            HintKind::Reflexive => "Reflexiv",
            HintKind::Preposition => "Präposition",
            HintKind::Object => "Objekt",
            HintKind::PrepositionalObject => "Präpositionalobjekt",
            HintKind::SeparablePrefix => "Verbzusatz",
        }
    }
}

/// A structural sentence pattern: which slots a sentence has and which
/// subjects it may take. Carries no words of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceTemplate {
    pub id: String,
    pub description: String,
    /// CEFR level; `None` matches every level.
    pub level: Option<String>,
    pub requires_object: bool,
    pub requires_prepositional_object: bool,
    /// Case the template's object slot is written for.
    pub object_case: Option<Case>,
    pub reflexive: Option<bool>,
    pub separable: Option<bool>,
    pub subject_set: Vec<Subject>,
    pub hints: Vec<HintKind>,
}

impl SentenceTemplate {
    pub fn new(id: impl Into<String>, subjects: impl IntoIterator<Item = Subject>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            level: None,
            requires_object: false,
            requires_prepositional_object: false,
            object_case: None,
            reflexive: None,
            separable: None,
            subject_set: subjects.into_iter().collect(),
            hints: Vec::new(),
        }
    }

    pub fn allows_subject(&self, subject: Subject) -> bool {
        self.subject_set.contains(&subject)
    }

    /// Restricted to the dummy subject `es`.
    pub fn is_impersonal(&self) -> bool {
        self.subject_set == [Subject::Es]
    }

    pub fn is_at_level(&self, level: &str) -> bool {
        self.level.as_deref().is_none_or(|l| l == level)
    }

    fn check(&self) -> Result<(), TemplateError> {
        let invalid = |reason: &str| TemplateError::InvalidTemplate {
            template: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("'id' must not be empty"));
        }
        if self.subject_set.is_empty() {
            return Err(invalid("'subjects' must not be empty"));
        }
        let unique: HashSet<&Subject> = self.subject_set.iter().collect();
        if unique.len() != self.subject_set.len() {
            return Err(invalid("'subjects' lists a subject twice"));
        }
        if self.object_case.is_some() && !self.requires_object {
            return Err(invalid("'object_case' needs 'requires_object: true'"));
        }
        Ok(())
    }
}

// ----------------- Template set -----------------

/// The ordered, validated template collection. Read-only after load.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: Vec<SentenceTemplate>,
}

impl TemplateSet {
    pub fn new(templates: Vec<SentenceTemplate>) -> Result<Self, TemplateError> {
        let mut seen = HashSet::new();
        for template in &templates {
            template.check()?;
            if !seen.insert(template.id.as_str()) {
                return Err(TemplateError::DuplicateId(template.id.clone()));
            }
        }
        Ok(Self { templates })
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TemplateError::FileError(format!("{}: {}", path.display(), e))
        })?;
        let set = Self::from_yaml(&content)?;
        info!(path = %path.display(), templates = set.len(), "loaded sentence templates");
        Ok(set)
    }

    /// Reads a document with a top-level `templates:` sequence.
    pub fn from_yaml(config: &str) -> Result<Self, TemplateError> {
        let docs = YamlLoader::load_from_str(config)
            .map_err(|e| TemplateError::YamlParseError(e.to_string()))?;

        let doc = docs
            .first()
            .ok_or(TemplateError::YamlParseError("Empty YAML".into()))?;

        let items = match &doc["templates"] {
            Yaml::Array(items) => items,
            _ => {
                return Err(TemplateError::YamlParseError(
                    "Missing 'templates' sequence".into(),
                ));
            }
        };

        let templates = items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::parse_template(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(templates)
    }

    fn parse_template(index: usize, item: &Yaml) -> Result<SentenceTemplate, TemplateError> {
        let id = required_str(&item["id"], "id").map_err(|reason| TemplateError::InvalidTemplate {
            template: format!("#{index}"),
            reason,
        })?;
        let invalid = |reason: String| TemplateError::InvalidTemplate {
            template: id.clone(),
            reason,
        };

        let mut subject_set = Vec::new();
        for key in string_list(&item["subjects"], "subjects").map_err(invalid)? {
            let subject = Subject::parse(&key)
                .ok_or_else(|| invalid(format!("unknown subject '{key}'")))?;
            subject_set.push(subject);
        }

        let mut hints = Vec::new();
        for key in string_list(&item["hints"], "hints").map_err(invalid)? {
            let hint =
                HintKind::parse(&key).ok_or_else(|| invalid(format!("unknown hint '{key}'")))?;
            hints.push(hint);
        }

        let requirements = &item["requirements"];
        let object_case = match optional_str(&requirements["object_case"], "object_case")
            .map_err(invalid)?
        {
            Some(raw) => Some(
                Case::parse(&raw).ok_or_else(|| invalid(format!("unknown case '{raw}'")))?,
            ),
            None => None,
        };

        Ok(SentenceTemplate {
            description: optional_str(&item["description"], "description")
                .map_err(invalid)?
                .unwrap_or_default(),
            level: optional_str(&item["level"], "level").map_err(invalid)?,
            requires_object: optional_bool(&item["requires_object"], "requires_object")
                .map_err(invalid)?
                .unwrap_or(false),
            requires_prepositional_object: optional_bool(
                &item["requires_prepositional_object"],
                "requires_prepositional_object",
            )
            .map_err(invalid)?
            .unwrap_or(false),
            object_case,
            reflexive: optional_bool(&requirements["reflexive"], "reflexive").map_err(invalid)?,
            separable: optional_bool(&requirements["separable"], "separable").map_err(invalid)?,
            subject_set,
            hints,
            id,
        })
    }

    pub fn templates(&self) -> &[SentenceTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&SentenceTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SentenceTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// ----------------- Matching -----------------

/// Lazily yields, in input order, the templates a verb can fill.
///
/// Cloning restarts from the clone's position, so a caller can walk the
/// sequence more than once. An exhausted or empty sequence is a normal
/// outcome: the caller tries another verb.
#[derive(Debug, Clone)]
pub struct CompatibleTemplates<'a> {
    remaining: std::slice::Iter<'a, SentenceTemplate>,
    verb: &'a VerbRecord,
    validator: ValencyValidator,
}

impl<'a> CompatibleTemplates<'a> {
    /// Narrows the sequence to templates without a level or at `level`.
    pub fn at_level<'l>(
        self,
        level: &'l str,
    ) -> impl Iterator<Item = &'a SentenceTemplate> + Clone + 'l
    where
        'a: 'l,
    {
        self.filter(move |t| t.is_at_level(level))
    }
}

impl<'a> Iterator for CompatibleTemplates<'a> {
    type Item = &'a SentenceTemplate;

    fn next(&mut self) -> Option<Self::Item> {
        for template in self.remaining.by_ref() {
            let missing = self.validator.missing_requirements(self.verb, template);
            if missing.is_empty() {
                return Some(template);
            }
            debug!(
                verb = self.verb.infinitive(),
                template = %template.id,
                reasons = ?missing,
                "template skipped"
            );
        }
        None
    }
}

/// Filters templates through the [`ValencyValidator`]. Never picks at
/// random; selection policy belongs to the caller.
#[derive(Debug, Clone, Copy)]
pub struct TemplateMatcher<'a> {
    templates: &'a [SentenceTemplate],
    validator: ValencyValidator,
}

impl<'a> TemplateMatcher<'a> {
    pub fn new(templates: &'a [SentenceTemplate]) -> Self {
        Self {
            templates,
            validator: ValencyValidator,
        }
    }

    pub fn compatible_templates(&self, verb: &'a VerbRecord) -> CompatibleTemplates<'a> {
        CompatibleTemplates {
            remaining: self.templates.iter(),
            verb,
            validator: self.validator,
        }
    }
}

/// Shorthand for [`TemplateMatcher::compatible_templates`].
pub fn compatible_templates<'a>(
    verb: &'a VerbRecord,
    all_templates: &'a [SentenceTemplate],
) -> CompatibleTemplates<'a> {
    TemplateMatcher::new(all_templates).compatible_templates(verb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verb::{Valency, VerbEntry};

    const TEST_YAML: &str = r#"
templates:
  - id: einfach
    level: A2
    description: "Bilde einen einfachen Satz."
    subjects: [ich, du, er, sie, wir, ihr, Sie, sie_plural]
    hints: [subject]

  - id: dativ_objekt
    level: A2
    requires_object: true
    requirements:
      object_case: dative
    subjects: [ich, du, wir]
    hints: [subject, object]

  - id: praeposition
    level: B1
    requires_prepositional_object: true
    subjects: [ich, du]
    hints: [subject, preposition, prepositional_object]

  - id: wetter
    subjects: [es]
"#;

    fn helfen() -> VerbRecord {
        let mut entry = VerbEntry::new("helfen", "helf");
        entry.valency = Valency::Dative;
        entry.allowed_objects = vec!["dem Kind".into()];
        entry.validate().unwrap()
    }

    fn warten() -> VerbRecord {
        let mut entry = VerbEntry::new("warten", "wart");
        entry.preposition = Some("auf".into());
        entry.allowed_prepositional_objects = vec!["den Bus".into()];
        entry.validate().unwrap()
    }

    #[test]
    fn test_set_creation() {
        let set = TemplateSet::from_yaml(TEST_YAML).unwrap();
        assert_eq!(set.len(), 4);

        let dativ = set.get("dativ_objekt").unwrap();
        assert!(dativ.requires_object);
        assert_eq!(dativ.object_case, Some(Case::Dative));
        assert_eq!(dativ.subject_set, [Subject::Ich, Subject::Du, Subject::Wir]);
        assert_eq!(dativ.hints, [HintKind::Subject, HintKind::Object]);

        let einfach = set.get("einfach").unwrap();
        assert!(einfach.allows_subject(Subject::Formal));
        assert!(einfach.allows_subject(Subject::SiePlural));
        assert!(!einfach.allows_subject(Subject::Es));

        assert!(set.get("wetter").unwrap().is_impersonal());
    }

    #[test]
    fn test_unknown_subject_is_rejected() {
        let yaml = "templates:\n  - id: kaputt\n    subjects: [ich, man]\n";
        match TemplateSet::from_yaml(yaml) {
            Err(TemplateError::InvalidTemplate { template, reason }) => {
                assert_eq!(template, "kaputt");
                assert!(reason.contains("man"));
            }
            other => panic!("expected InvalidTemplate, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let yaml = "templates:\n  - id: a\n    subjects: [ich]\n  - id: a\n    subjects: [du]\n";
        assert!(matches!(
            TemplateSet::from_yaml(yaml),
            Err(TemplateError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_empty_subject_set_is_rejected() {
        let yaml = "templates:\n  - id: leer\n";
        assert!(matches!(
            TemplateSet::from_yaml(yaml),
            Err(TemplateError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_object_case_without_object_slot_is_rejected() {
        let yaml = "templates:\n  - id: x\n    subjects: [ich]\n    requirements:\n      object_case: dative\n";
        assert!(TemplateSet::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_matcher_keeps_input_order() {
        let set = TemplateSet::from_yaml(TEST_YAML).unwrap();
        let helfen = helfen();
        let ids: Vec<&str> = compatible_templates(&helfen, set.templates())
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["einfach", "dativ_objekt"]);

        let warten = warten();
        let ids: Vec<&str> = compatible_templates(&warten, set.templates())
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["einfach", "praeposition"]);
    }

    #[test]
    fn test_matcher_is_restartable() {
        let set = TemplateSet::from_yaml(TEST_YAML).unwrap();
        let helfen = helfen();
        let matches = TemplateMatcher::new(set.templates()).compatible_templates(&helfen);
        let first: Vec<_> = matches.clone().collect();
        let second: Vec<_> = matches.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_level_filter() {
        let set = TemplateSet::from_yaml(TEST_YAML).unwrap();
        let warten = warten();
        let ids: Vec<&str> = compatible_templates(&warten, set.templates())
            .at_level("A2")
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["einfach"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let set = TemplateSet::new(vec![SentenceTemplate::new("wetter", [Subject::Es])]).unwrap();
        let helfen = helfen();
        assert_eq!(compatible_templates(&helfen, set.templates()).count(), 0);
    }
}
