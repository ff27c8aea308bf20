//! A grammar engine for German present-tense practice sentences.
//!
//! Verbs and sentence templates are declared as data. The engine conjugates
//! a verb, checks its valency and case government against a template, and
//! assembles a V2 main clause with reflexive pronoun and separable prefix in
//! place. It refuses anything the data does not license instead of guessing.
//!
//! ```no_run
//! use std::path::Path;
//! use satzbau::{Fillers, Grammar};
//!
//! let grammar = Grammar::from_files(Path::new("data/verbs.yaml"), Path::new("data/templates.yaml"))?;
//! let essen = grammar.verb("essen").unwrap();
//! let template = grammar.compatible_templates(essen).find(|t| t.requires_object).unwrap();
//! let sentence = grammar.generate(essen, template, "du", &Fillers::new().with_object("das Brot"))?;
//! assert_eq!(sentence.text(), "Du isst das Brot.");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

pub mod case;
pub mod catalog;
pub mod config;
pub mod conjugation;
pub mod debug;
pub mod exercise;
pub mod sentence;
pub mod templates;
pub mod utility;
pub mod valency;
pub mod verb;

pub use case::{Case, CaseMarking};
pub use catalog::{CatalogError, VerbCatalog};
pub use config::{Config, ConfigError};
pub use conjugation::{ConjugationError, Conjugator};
pub use debug::TracePrinter;
pub use exercise::{Exercise, Hint};
pub use sentence::{Fillers, GenerationError, SentenceBuilder, SentenceResult, SentenceTrace};
pub use templates::{CompatibleTemplates, HintKind, SentenceTemplate, TemplateError, TemplateSet};
pub use valency::{Incompatibility, ValencyValidator};
pub use verb::{Subject, Valency, VerbEntry, VerbRecord, VerbValidationError};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Templates(#[from] TemplateError),
}

/// The verb catalog and template set, validated and frozen, plus the
/// stateless components that work on them. Safe to share between threads.
#[derive(Debug, Clone)]
pub struct Grammar {
    verbs: VerbCatalog,
    templates: TemplateSet,
    conjugator: Conjugator,
    builder: SentenceBuilder,
}

impl Grammar {
    pub fn new(verbs: VerbCatalog, templates: TemplateSet) -> Self {
        Self {
            verbs,
            templates,
            conjugator: Conjugator::new(),
            builder: SentenceBuilder::new(),
        }
    }

    pub fn from_files(verbs_path: &Path, templates_path: &Path) -> Result<Self, LoadError> {
        let verbs = VerbCatalog::from_file(verbs_path)?;
        let templates = TemplateSet::from_file(templates_path)?;
        Ok(Self::new(verbs, templates))
    }

    pub fn verbs(&self) -> &VerbCatalog {
        &self.verbs
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn verb(&self, infinitive: &str) -> Option<&VerbRecord> {
        self.verbs.get(infinitive)
    }

    pub fn template(&self, id: &str) -> Option<&SentenceTemplate> {
        self.templates.get(id)
    }

    pub fn conjugate(&self, verb: &VerbRecord, subject: &str) -> Result<String, ConjugationError> {
        self.conjugator.resolve(verb, subject)
    }

    /// Templates `verb` can fill, lazily and in declaration order.
    pub fn compatible_templates<'a>(&'a self, verb: &'a VerbRecord) -> CompatibleTemplates<'a> {
        templates::compatible_templates(verb, self.templates.templates())
    }

    /// Builds one sentence. `subject` uses the data spelling (`"du"`,
    /// `"Sie"`, `"sie_plural"`).
    pub fn generate(
        &self,
        verb: &VerbRecord,
        template: &SentenceTemplate,
        subject: &str,
        fillers: &Fillers,
    ) -> Result<SentenceResult, GenerationError> {
        let subject: Subject = subject.parse()?;
        self.builder.build(verb, template, subject, fillers)
    }
}
