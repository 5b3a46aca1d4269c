//! Command-line front end for the reasoner core.
//!
//! No DL concrete-syntax parser lives here — a "script" is a tiny
//! line-oriented format that drives [`factpp_core::session::Session`]'s
//! programmatic builder directly, one declaration per line:
//!
//! ```text
//! concept Person
//! concept Student
//! sub Student Person
//! role hasParent
//! disjoint-roles hasParent hasSpouse
//! ```
//!
//! ```bash
//! factpp ontology.fpp           # load, report consistency + taxonomy
//! factpp ontology.fpp --repl    # then drop into an interactive prompt
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use factpp_core::config::ReasoningConfig;
use factpp_core::session::Session;

#[derive(Parser, Debug)]
#[command(name = "factpp", about = "A tableau-based DL reasoner", version)]
struct Cli {
    /// Axiom script to load before reporting.
    script: Option<PathBuf>,

    /// Drop into an interactive prompt after loading the script.
    #[arg(short, long)]
    repl: bool,

    /// Config file to merge on top of the default two-layer load.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip classification; only report consistency.
    #[arg(long)]
    no_classify: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReasoningConfig::from_file(&path.to_string_lossy())?,
        None => ReasoningConfig::load().unwrap_or_else(|_| ReasoningConfig::default()),
    };
    tracing_subscriber::fmt().with_env_filter(config.logging.level.as_str()).init();

    let mut session = Session::new(config);

    if let Some(script) = &cli.script {
        println!("Loading script: {}", script.display());
        let source = fs::read_to_string(script)?;
        load_script(&mut session, &source)?;
        println!();
    } else {
        println!("factpp reasoner core");
        println!("=====================");
        println!();
        println!("No script given; starting with an empty ontology.");
        println!();
    }

    session.finalize()?;

    match session.is_consistent() {
        Ok(true) => println!("Ontology is consistent."),
        Ok(false) => println!("Ontology is INCONSISTENT."),
        Err(e) => println!("Consistency check failed: {e}"),
    }

    if !cli.no_classify {
        match session.classify() {
            Ok(tax) => println!("Taxonomy built: {} vertices.", tax.len()),
            Err(e) => println!("Classification failed: {e}"),
        }
    }

    if cli.repl {
        run_repl(&mut session)?;
    }

    Ok(())
}

/// Run one `concept`/`role`/`sub`/`equiv`/`disjoint-roles` directive.
fn run_directive(session: &mut Session, line: &str) -> Result<(), String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["concept", name] => {
            session.declare_concept(name);
            Ok(())
        }
        ["role", name] => {
            session.declare_role(name, false);
            Ok(())
        }
        ["data-role", name] => {
            session.declare_role(name, true);
            Ok(())
        }
        ["sub", lhs, rhs] => {
            let lhs = session.concept_named(lhs).ok_or_else(|| format!("undeclared concept '{lhs}'"))?;
            let rhs = session.concept_named(rhs).ok_or_else(|| format!("undeclared concept '{rhs}'"))?;
            session.add_subsumption(lhs, rhs);
            Ok(())
        }
        ["equiv", lhs, rhs] => {
            let lhs = session.concept_named(lhs).ok_or_else(|| format!("undeclared concept '{lhs}'"))?;
            let rhs = session.concept_named(rhs).ok_or_else(|| format!("undeclared concept '{rhs}'"))?;
            session.add_equivalence(lhs, rhs);
            Ok(())
        }
        ["disjoint-roles", r, s] => {
            let r = session.declare_role(r, false);
            let s = session.declare_role(s, false);
            session.add_disjoint_roles(r, s);
            Ok(())
        }
        [] => Ok(()),
        _ => Err(format!("unrecognised directive: '{line}'")),
    }
}

fn load_script(session: &mut Session, source: &str) -> anyhow::Result<()> {
    for (num, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        run_directive(session, line).map_err(|e| anyhow::anyhow!("line {}: {e}", num + 1))?;
    }
    Ok(())
}

fn run_repl(session: &mut Session) -> anyhow::Result<()> {
    println!("Entering REPL. Directives: concept/role/sub/equiv/disjoint-roles, '.quit' to exit.");
    loop {
        print!("factpp> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line == ".quit" || line == ".exit" {
            break;
        }
        if line == ".consistent" {
            match session.is_consistent() {
                Ok(v) => println!("{v}"),
                Err(e) => println!("error: {e}"),
            }
            continue;
        }
        if let Err(e) = run_directive(session, line) {
            println!("error: {e}");
        }
    }
    Ok(())
}
