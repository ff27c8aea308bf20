//! Picking what to practise next. This is the only place randomness
//! enters; every function takes the caller's `Rng`.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::debug;

use crate::case::Case;
use crate::sentence::{Fillers, GenerationError, SentenceResult};
use crate::templates::{HintKind, SentenceTemplate};
use crate::verb::{Subject, VerbRecord};
use crate::Grammar;

/// Active verbs first, then the rest, both limited to `level`. Frozen
/// verbs never take part in free generation.
pub fn prioritize_active<'a>(
    verbs: impl IntoIterator<Item = &'a VerbRecord>,
    active: &[String],
    level: &str,
) -> Vec<&'a VerbRecord> {
    let (mut first, rest): (Vec<_>, Vec<_>) = verbs
        .into_iter()
        .filter(|v| !v.is_frozen() && v.is_at_level(level))
        .partition(|v| active.iter().any(|a| a == v.infinitive()));
    first.extend(rest);
    first
}

/// Draws from the active verbs with probability `weight`, otherwise from
/// the rest. Only verbs with a compatible template at `level` count; if
/// one pool is empty the other is used.
pub fn select_verb<'a, R: Rng + ?Sized>(
    grammar: &'a Grammar,
    active: &[String],
    level: &str,
    weight: f64,
    rng: &mut R,
) -> Option<&'a VerbRecord> {
    let (active_pool, other_pool): (Vec<&VerbRecord>, Vec<&VerbRecord>) =
        prioritize_active(grammar.verbs().iter(), active, level)
            .into_iter()
            .filter(|v| grammar.compatible_templates(v).at_level(level).next().is_some())
            .partition(|v| active.iter().any(|a| a == v.infinitive()));

    let prefer_active = rng.gen_bool(weight.clamp(0.0, 1.0));
    let (pool, fallback) = if prefer_active {
        (&active_pool, &other_pool)
    } else {
        (&other_pool, &active_pool)
    };
    let chosen = pool.choose(rng).or_else(|| fallback.choose(rng)).copied();
    debug!(verb = chosen.map(|v| v.infinitive()), prefer_active, "verb selected");
    chosen
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hint {
    pub kind: HintKind,
    pub text: String,
}

/// One practice item: everything needed to show the prompt and, later,
/// build the solution.
#[derive(Debug, Clone)]
pub struct Exercise<'a> {
    pub verb: &'a VerbRecord,
    pub template: &'a SentenceTemplate,
    pub subject: Subject,
    pub fillers: Fillers,
    pub hints: Vec<Hint>,
    pub description: String,
}

impl<'a> Exercise<'a> {
    /// Tries the compatible templates at `level` in random order and
    /// returns the first one that can be filled. `None` when none can, e.g.
    /// when a ditransitive object list has no two distinct fillers.
    pub fn generate<R: Rng + ?Sized>(
        grammar: &'a Grammar,
        verb: &'a VerbRecord,
        level: &str,
        rng: &mut R,
    ) -> Option<Exercise<'a>> {
        let mut candidates: Vec<&SentenceTemplate> =
            grammar.compatible_templates(verb).at_level(level).collect();
        candidates.shuffle(rng);

        candidates
            .into_iter()
            .find_map(|template| Self::for_template(verb, template, rng))
    }

    fn for_template<R: Rng + ?Sized>(
        verb: &'a VerbRecord,
        template: &'a SentenceTemplate,
        rng: &mut R,
    ) -> Option<Exercise<'a>> {
        let subject = *template.subject_set.choose(rng)?;
        let Some(fillers) = pick_fillers(verb, template, rng) else {
            debug!(verb = verb.infinitive(), template = %template.id, "no fillers, next template");
            return None;
        };
        let hints = build_hints(verb, template, subject, &fillers);

        debug!(
            verb = verb.infinitive(),
            template = %template.id,
            %subject,
            "exercise generated"
        );
        Some(Exercise {
            verb,
            template,
            subject,
            fillers,
            hints,
            description: template.description.clone(),
        })
    }

    pub fn solution(&self, grammar: &Grammar) -> Result<SentenceResult, GenerationError> {
        grammar.generate(self.verb, self.template, self.subject.key(), &self.fillers)
    }
}

fn pick_fillers<R: Rng + ?Sized>(
    verb: &VerbRecord,
    template: &SentenceTemplate,
    rng: &mut R,
) -> Option<Fillers> {
    let mut fillers = Fillers::new();

    if template.requires_object {
        if verb.is_ditransitive() {
            // a form that admits both cases may fill either slot, not both
            let pairs: Vec<(&str, &str)> = verb
                .objects_admitting(Case::Dative)
                .flat_map(|dative| {
                    verb.objects_admitting(Case::Accusative)
                        .filter(move |accusative| *accusative != dative)
                        .map(move |accusative| (dative, accusative))
                })
                .collect();
            let (dative, accusative) = *pairs.choose(rng)?;
            fillers = fillers.with_object(dative).with_object(accusative);
        } else {
            fillers = fillers.with_object(verb.allowed_objects().choose(rng)?.clone());
        }
    }

    if template.requires_prepositional_object {
        let object = verb.allowed_prepositional_objects().choose(rng)?;
        fillers = fillers.with_prepositional_object(object.clone());
    }

    Some(fillers)
}

fn build_hints(
    verb: &VerbRecord,
    template: &SentenceTemplate,
    subject: Subject,
    fillers: &Fillers,
) -> Vec<Hint> {
    template
        .hints
        .iter()
        .filter_map(|kind| {
            let text = match kind {
                HintKind::Subject => Some(subject.hint_label().to_string()),
                HintKind::Reflexive => verb.is_reflexive().then(|| "sich".to_string()),
                HintKind::Preposition => verb.preposition().map(str::to_string),
                HintKind::Object => {
                    (!fillers.objects.is_empty()).then(|| fillers.objects.join(", "))
                }
                HintKind::PrepositionalObject => fillers.prepositional_object.clone(),
                HintKind::SeparablePrefix => verb.separable_prefix().map(str::to_string),
            }?;
            Some(Hint { kind: *kind, text })
        })
        .collect()
}
