use std::fmt::Write;

use crate::case::Case;
use crate::sentence::SentenceResult;

/// Renders the grammatical breakdown of a built sentence, one line per
/// decision. Returns text; printing is up to the caller.
pub struct TracePrinter;

impl TracePrinter {
    fn case_label(case: Case) -> String {
        format!("{}objekt", case.german_name())
    }

    fn line(out: &mut String, label: &str, value: &str) {
        // writing into a String cannot fail
        let _ = writeln!(out, "  {:<18}{}", format!("{label}:"), value);
    }

    pub fn render(result: &SentenceResult) -> String {
        let trace = &result.trace;
        let mut out = String::new();
        let _ = writeln!(out, "{}", result.text());

        Self::line(&mut out, "Vorlage", &trace.template_id);
        Self::line(&mut out, "Subjekt", trace.subject.pronoun());
        Self::line(
            &mut out,
            "Verb",
            &format!("{} ({})", trace.finite_form, trace.verb),
        );
        if let Some(reflexive) = &trace.reflexive {
            Self::line(
                &mut out,
                "Reflexivpronomen",
                &format!("{} ({})", reflexive.pronoun, reflexive.case.german_name()),
            );
        }
        for object in &trace.objects {
            Self::line(&mut out, &Self::case_label(object.case), &object.text);
        }
        if let (Some(preposition), Some(object)) = (&trace.preposition, &trace.prepositional_object) {
            Self::line(&mut out, "Präpositionalobj.", &format!("{preposition} {object}"));
        }
        if let Some(prefix) = &trace.separable_prefix {
            Self::line(&mut out, "Verbzusatz", prefix);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::{build, Fillers};
    use crate::templates::SentenceTemplate;
    use crate::verb::{Subject, Valency, VerbEntry};

    #[test]
    fn test_render_ditransitive() {
        let mut entry = VerbEntry::new("geben", "geb");
        entry.valency = Valency::Accusative;
        entry.required_objects = [Case::Dative, Case::Accusative].into_iter().collect();
        entry.allowed_objects = vec!["dem Freund".into(), "das Buch".into()];
        let geben = entry.validate().unwrap();

        let mut template = SentenceTemplate::new("objekt", [Subject::Ich]);
        template.requires_object = true;
        let fillers = Fillers::new().with_object("dem Freund").with_object("das Buch");
        let result = build(&geben, &template, Subject::Ich, &fillers).unwrap();

        let rendered = TracePrinter::render(&result);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Ich gebe dem Freund das Buch.");
        assert!(rendered.contains("Dativobjekt:"));
        assert!(rendered.contains("Akkusativobjekt:"));
        assert!(rendered.contains("gebe (geben)"));
        assert!(!rendered.contains("Verbzusatz"));
    }
}
