//! `fexpr`: compile an expression and evaluate it against a JSON document.

mod logging;

use anyhow::{Context as _, Result};
use clap::Parser;
use ferrum_expr::{compile_with, CompileOptions, Output};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "fexpr", version, about = "Evaluate an expression against a JSON document")]
struct Cli {
    /// Expression to compile and evaluate
    expression: String,

    /// JSON input file; `-` or absent reads stdin
    #[arg(short, long, env = "FEXPR_INPUT")]
    input: Option<PathBuf>,

    /// Print the result as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Only compile the expression; no input is read
    #[arg(long)]
    check: bool,

    /// Maximum nesting depth accepted by the compiler
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut options = CompileOptions::new();
    if let Some(depth) = cli.max_depth {
        options = options.max_depth(depth);
    }

    let expr = compile_with(&cli.expression, options).context("failed to compile expression")?;
    tracing::debug!(expression = %expr, "compiled");

    if cli.check {
        println!("ok");
        return Ok(());
    }

    let document = read_input(cli.input.as_ref())?;
    let output = expr.eval(&document).context("evaluation failed")?;
    println!("{}", render(&output, cli.json)?);
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<serde_json::Value> {
    let text = match path {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn render(output: &Output, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(&output.to_json())?)
    } else {
        Ok(output.to_string())
    }
}
