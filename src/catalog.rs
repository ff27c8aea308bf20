use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};
use yaml_rust2::{Yaml, YamlLoader};

use crate::case::Case;
use crate::utility::{optional_bool, optional_str, required_str, string_list};
use crate::verb::{
    Auxiliary, GenerationMode, Subject, Valency, VerbEntry, VerbRecord, VerbValidationError,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("verb #{index} ('{verb}'): field '{field}': {reason}")]
    Field {
        index: usize,
        verb: String,
        field: &'static str,
        reason: String,
    },

    #[error("Invalid verb data: {0}")]
    Validation(#[from] VerbValidationError),
}

/// All verbs, validated and indexed by infinitive. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct VerbCatalog {
    verbs: Vec<VerbRecord>,
    by_infinitive: HashMap<String, usize>,
}

impl VerbCatalog {
    /// Validates every entry and reports every violation in one error.
    pub fn from_entries(entries: Vec<VerbEntry>) -> Result<Self, CatalogError> {
        let mut errors = Vec::new();
        let mut verbs = Vec::with_capacity(entries.len());
        let mut by_infinitive = HashMap::new();

        for entry in entries {
            let infinitive = entry.infinitive.clone();
            if by_infinitive.contains_key(&infinitive) {
                errors.push(VerbValidationError::DuplicateInfinitive(infinitive));
                continue;
            }
            match entry.validate() {
                Ok(record) => {
                    by_infinitive.insert(infinitive, verbs.len());
                    verbs.push(record);
                }
                Err(e) => {
                    // keep the key so a later duplicate is still reported
                    by_infinitive.insert(infinitive, usize::MAX);
                    errors.push(e);
                }
            }
        }

        VerbValidationError::collect(errors)?;
        Ok(Self {
            verbs,
            by_infinitive,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_yaml(&content)?;
        info!(path = %path.display(), verbs = catalog.len(), "loaded verb catalog");
        Ok(catalog)
    }

    /// Reads a document with a top-level `verbs:` sequence.
    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let docs =
            YamlLoader::load_from_str(content).map_err(|e| CatalogError::Yaml(e.to_string()))?;
        let doc = docs
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::Yaml("Empty YAML file".into()))?;

        let items = doc["verbs"]
            .as_vec()
            .ok_or_else(|| CatalogError::Yaml("Missing or invalid 'verbs' (must be a sequence)".into()))?;

        let entries = items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::parse_entry(index, item))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(entries = entries.len(), "parsed verb entries");

        Self::from_entries(entries)
    }

    fn parse_entry(index: usize, y: &Yaml) -> Result<VerbEntry, CatalogError> {
        let field_error = |verb: &str, field: &'static str, reason: String| CatalogError::Field {
            index,
            verb: verb.to_string(),
            field,
            reason,
        };

        if y.as_hash().is_none() {
            return Err(field_error("?", "verbs", "each verb must be a map".into()));
        }

        let infinitive =
            required_str(&y["infinitive"], "infinitive").map_err(|r| field_error("?", "infinitive", r))?;
        let verb = infinitive.as_str();
        let field_error = &field_error;
        let err = |field: &'static str| move |reason: String| field_error(verb, field, reason);

        let stem = required_str(&y["stem"], "stem").map_err(err("stem"))?;
        let mut entry = VerbEntry::new(infinitive.clone(), stem);

        entry.separable_prefix =
            optional_str(&y["separable_prefix"], "separable_prefix").map_err(err("separable_prefix"))?;
        entry.reflexive = optional_bool(&y["reflexive"], "reflexive")
            .map_err(err("reflexive"))?
            .unwrap_or(false);
        entry.impersonal = optional_bool(&y["impersonal"], "impersonal")
            .map_err(err("impersonal"))?
            .unwrap_or(false);
        entry.epenthesis = optional_bool(&y["epenthesis"], "epenthesis")
            .map_err(err("epenthesis"))?
            .unwrap_or(false);
        entry.preposition =
            optional_str(&y["preposition"], "preposition").map_err(err("preposition"))?;

        entry.valency = match &y["valency"] {
            Yaml::BadValue | Yaml::Null => Valency::None,
            Yaml::String(raw) => Valency::parse(raw)
                .ok_or_else(|| err("valency")(format!("unknown valency '{raw}'")))?,
            other => return Err(err("valency")(format!("must be a string, got {other:?}"))),
        };

        entry.allowed_objects =
            string_list(&y["allowed_objects"], "allowed_objects").map_err(err("allowed_objects"))?;
        entry.allowed_prepositional_objects = string_list(
            &y["allowed_prepositional_objects"],
            "allowed_prepositional_objects",
        )
        .map_err(err("allowed_prepositional_objects"))?;

        for raw in
            string_list(&y["required_objects"], "required_objects").map_err(err("required_objects"))?
        {
            let case = Case::parse(&raw)
                .ok_or_else(|| err("required_objects")(format!("unknown case '{raw}'")))?;
            entry.required_objects.insert(case);
        }

        match &y["irregular_present"] {
            Yaml::BadValue | Yaml::Null => {}
            Yaml::Hash(forms) => {
                for (key, value) in forms {
                    let (Yaml::String(key), Yaml::String(form)) = (key, value) else {
                        return Err(err("irregular_present")(format!(
                            "entries must map a subject to a form, got {key:?}: {value:?}"
                        )));
                    };
                    let subject = Subject::parse(key)
                        .ok_or_else(|| err("irregular_present")(format!("unknown subject '{key}'")))?;
                    entry.irregular_present.insert(subject, form.clone());
                }
            }
            other => {
                return Err(err("irregular_present")(format!("must be a map, got {other:?}")));
            }
        }

        if let Some(raw) = optional_str(&y["auxiliary"], "auxiliary").map_err(err("auxiliary"))? {
            entry.auxiliary = Auxiliary::parse(&raw)
                .ok_or_else(|| err("auxiliary")(format!("unknown auxiliary '{raw}'")))?;
        }
        if let Some(raw) =
            optional_str(&y["generation_mode"], "generation_mode").map_err(err("generation_mode"))?
        {
            entry.generation_mode = GenerationMode::parse(&raw)
                .ok_or_else(|| err("generation_mode")(format!("unknown generation mode '{raw}'")))?;
        }

        entry.partizip_ii =
            optional_str(&y["partizip_ii"], "partizip_ii").map_err(err("partizip_ii"))?;
        entry.levels = string_list(&y["levels"], "levels").map_err(err("levels"))?;
        entry.english_meaning =
            optional_str(&y["english_meaning"], "english_meaning").map_err(err("english_meaning"))?;
        entry.fixed_examples =
            string_list(&y["fixed_examples"], "fixed_examples").map_err(err("fixed_examples"))?;

        Ok(entry)
    }

    pub fn get(&self, infinitive: &str) -> Option<&VerbRecord> {
        self.by_infinitive
            .get(infinitive)
            .and_then(|i| self.verbs.get(*i))
    }

    pub fn verbs(&self) -> &[VerbRecord] {
        &self.verbs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VerbRecord> {
        self.verbs.iter()
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_YAML: &str = r#"
verbs:
  - infinitive: essen
    stem: ess
    valency: accusative
    allowed_objects: [das Brot, einen Apfel]
    irregular_present: { du: isst, er: isst, sie: isst, es: isst }
    partizip_ii: gegessen
    levels: [A1, A2]
    english_meaning: to eat

  - infinitive: warten
    stem: wart
    epenthesis: true
    preposition: auf
    allowed_prepositional_objects: [den Bus]
    levels: [A2]

  - infinitive: geben
    stem: geb
    valency: akk
    required_objects: [dative, accusative]
    allowed_objects: [dem Freund, das Buch]
    irregular_present: { du: gibst, er: gibt }

  - infinitive: sich anziehen
    stem: zieh
    reflexive: true
    separable_prefix: an
"#;

    #[test]
    fn test_catalog_creation() {
        let catalog = VerbCatalog::from_yaml(TEST_YAML).unwrap();
        assert_eq!(catalog.len(), 4);

        let essen = catalog.get("essen").unwrap();
        assert_eq!(essen.valency(), Valency::Accusative);
        assert_eq!(essen.irregular_present(Subject::Es), Some("isst"));
        assert_eq!(essen.partizip_ii(), Some("gegessen"));
        assert!(essen.is_at_level("A1"));

        assert!(catalog.get("warten").unwrap().has_epenthesis());
        assert!(catalog.get("geben").unwrap().is_ditransitive());
        assert_eq!(catalog.get("sich anziehen").unwrap().separable_prefix(), Some("an"));
        assert!(catalog.get("laufen").is_none());
    }

    #[test]
    fn test_order_is_preserved() {
        let catalog = VerbCatalog::from_yaml(TEST_YAML).unwrap();
        let names: Vec<&str> = catalog.iter().map(|v| v.infinitive()).collect();
        assert_eq!(names, ["essen", "warten", "geben", "sich anziehen"]);
    }

    #[test]
    fn test_unknown_valency_names_the_field() {
        let yaml = "verbs:\n  - infinitive: helfen\n    stem: helf\n    valency: genitiv\n";
        match VerbCatalog::from_yaml(yaml) {
            Err(CatalogError::Field { verb, field, .. }) => {
                assert_eq!(verb, "helfen");
                assert_eq!(field, "valency");
            }
            other => panic!("expected Field error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_override_subject() {
        let yaml = "verbs:\n  - infinitive: lesen\n    stem: les\n    irregular_present: { man: liest }\n";
        assert!(matches!(
            VerbCatalog::from_yaml(yaml),
            Err(CatalogError::Field { field: "irregular_present", .. })
        ));
    }

    #[test]
    fn test_violations_across_verbs_are_collected() {
        let yaml = r#"
verbs:
  - infinitive: helfen
    stem: helf
    valency: dative
  - infinitive: warten
    stem: wart
    preposition: auf
"#;
        match VerbCatalog::from_yaml(yaml) {
            Err(CatalogError::Validation(VerbValidationError::MultipleErrors(errors))) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field(), Some("allowed_objects"));
                assert_eq!(errors[1].field(), Some("allowed_prepositional_objects"));
            }
            other => panic!("expected MultipleErrors, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_infinitive() {
        let entries = vec![
            VerbEntry::new("machen", "mach"),
            VerbEntry::new("machen", "mach"),
        ];
        assert!(matches!(
            VerbCatalog::from_entries(entries),
            Err(CatalogError::Validation(VerbValidationError::DuplicateInfinitive(v))) if v == "machen"
        ));
    }

    #[test]
    fn test_missing_verbs_key() {
        assert!(matches!(
            VerbCatalog::from_yaml("templates: []\n"),
            Err(CatalogError::Yaml(_))
        ));
    }
}
