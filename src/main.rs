use rand::SeedableRng;
use rand::rngs::StdRng;
use satzbau::exercise::{select_verb, Exercise};
use satzbau::{Config, Grammar, TracePrinter};
use serde_json::json;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

// A verb can pass selection and still fail to produce an exercise
// (e.g. no distinct ditransitive fillers); try a few others before giving up.
const MAX_ATTEMPTS: usize = 10;

struct Args {
    verbs: PathBuf,
    templates: PathBuf,
    config: Option<PathBuf>,
    json: bool,
    seed: Option<u64>,
}

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {program} --verbs <verbs.yaml> --templates <templates.yaml> [--config <config.yaml>] [--json] [--seed <n>]"
    );
    std::process::exit(1);
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("satzbau");

    let mut verbs = None;
    let mut templates = None;
    let mut config = None;
    let mut json = false;
    let mut seed = None;

    let mut rest = args.iter().skip(1);
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--verbs" => verbs = rest.next().map(PathBuf::from),
            "--templates" => templates = rest.next().map(PathBuf::from),
            "--config" => config = rest.next().map(PathBuf::from),
            "--json" => json = true,
            "--seed" => match rest.next().and_then(|s| s.parse().ok()) {
                Some(n) => seed = Some(n),
                None => usage(program),
            },
            _ => usage(program),
        }
    }

    match (verbs, templates) {
        (Some(verbs), Some(templates)) => Args {
            verbs,
            templates,
            config,
            json,
            seed,
        },
        _ => usage(program),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = parse_args();

    let grammar = Grammar::from_files(&args.verbs, &args.templates)?;
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for attempt in 1..=MAX_ATTEMPTS {
        let Some(verb) = select_verb(
            &grammar,
            &config.active_verbs,
            &config.level,
            config.active_weight,
            &mut rng,
        ) else {
            return Err(format!("no verb has a template at level {}", config.level).into());
        };

        let Some(exercise) = Exercise::generate(&grammar, verb, &config.level, &mut rng) else {
            debug!(attempt, verb = verb.infinitive(), "no exercise, retrying");
            continue;
        };
        let solution = match exercise.solution(&grammar) {
            Ok(solution) => solution,
            Err(e) => {
                debug!(attempt, verb = verb.infinitive(), error = %e, "generation failed, retrying");
                continue;
            }
        };

        if args.json {
            let out = json!({
                "verb": verb.infinitive(),
                "english_meaning": verb.english_meaning(),
                "template": exercise.template.id,
                "description": exercise.description,
                "subject": exercise.subject,
                "hints": exercise.hints,
                "solution": solution.text(),
                "trace": solution.trace,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            return Ok(());
        }

        match verb.english_meaning().filter(|_| config.show_meaning) {
            Some(meaning) => println!("Verb: {} ({meaning})", verb.infinitive()),
            None => println!("Verb: {}", verb.infinitive()),
        }
        for hint in &exercise.hints {
            println!("  {}: {}", hint.kind.label(), hint.text);
        }
        if !exercise.description.is_empty() {
            println!("{}", exercise.description);
        }

        print!("\n[ENTER] für die Lösung ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;

        println!();
        print!("{}", TracePrinter::render(&solution));
        return Ok(());
    }

    warn!(attempts = MAX_ATTEMPTS, "giving up");
    Err(format!("could not generate an exercise after {MAX_ATTEMPTS} attempts").into())
}
