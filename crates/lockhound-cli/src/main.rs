use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use lockhound_checkers::Checker;
use lockhound_diagnostics::diagnostic::Collector;
use lockhound_diagnostics::human::format_human;
use lockhound_diagnostics::rules::{get_all_rules, get_rule};
use lockhound_ir::ir::Program;

#[derive(Parser)]
#[command(name = "lockhound")]
#[command(about = "Concurrency-bug detector for Go SSA")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a bridge-produced IR document
    Check {
        /// Path to the IR JSON document
        input: PathBuf,
        /// Also analyze files flagged as machine-generated
        #[arg(long)]
        check_generated: bool,
        /// Output format: human or json
        #[arg(long, default_value = "human")]
        format: String,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Explain a rule in detail
    Explain {
        /// Rule code (e.g., SA2005)
        rule: String,
    },
    /// List all rules
    Rules,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check {
            input,
            check_generated,
            format,
            no_color,
        } => run_check(&input, check_generated, &format, no_color),
        Commands::Explain { rule } => explain(&rule),
        Commands::Rules => {
            for rule in get_all_rules() {
                let suffix = if rule.enabled { "" } else { " (disabled)" };
                println!("{}  {}{suffix}", rule.code, rule.name);
            }
            Ok(())
        }
    }
}

fn run_check(
    input: &PathBuf,
    check_generated: bool,
    format: &str,
    no_color: bool,
) -> anyhow::Result<()> {
    let data = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let mut program: Program = serde_json::from_str(&data).context("parsing IR document")?;
    program.validate().context("malformed IR document")?;

    info!(
        functions = program.ssa.functions.len(),
        initial = program.ssa.initial.len(),
        "analyzing"
    );

    let mut checker = Checker::new();
    checker.check_generated = check_generated;
    let mut sink = Collector::new();
    checker.run(&mut program, &mut sink);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&sink.diagnostics)?),
        _ => print!("{}", format_human(&sink.diagnostics, !no_color)),
    }
    Ok(())
}

fn explain(code: &str) -> anyhow::Result<()> {
    let Some(rule) = get_rule(code) else {
        anyhow::bail!("unknown rule: {code}");
    };
    println!("{}  {}", rule.code, rule.name);
    println!();
    println!("{}", rule.description);
    if !rule.enabled {
        println!();
        println!("This rule is registered but disabled by default.");
    }
    Ok(())
}
