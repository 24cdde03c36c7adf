//! tokex-match - Compile a grammar and match it against an input
//!
//! # Usage
//!
//! ```bash
//! # Match an input string directly
//! tokex-match --grammar grammar.tokex --input "hello world"
//!
//! # Match the contents of an input file
//! tokex-match --grammar grammar.tokex --input-file query.txt
//!
//! # Require the match to consume every token
//! tokex-match --grammar grammar.tokex --input "hello world" --entire
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use tokex::flags::default_flags;
use tokex::tokenizer::DefaultTokenizer;
use tokex::tokenizers::{NumericTokenizer, SqlTokenizer};

/// Compile a grammar and match it against an input, printing the
/// resulting capture tree as JSON.
#[derive(Parser, Debug)]
#[command(name = "tokex-match")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a file containing the grammar source.
    #[arg(short, long)]
    grammar: PathBuf,

    /// Input string to match directly.
    #[arg(short, long, conflicts_with = "input_file")]
    input: Option<String>,

    /// Path to a file containing the input to match.
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Require the match to consume every token, not just a prefix.
    #[arg(short, long)]
    entire: bool,

    /// Allow `def name { ... }` sub grammar definitions.
    #[arg(long, default_value_t = true)]
    allow_sub_grammars: bool,

    /// Which tokenizer to split the input with.
    #[arg(short, long, value_enum, default_value = "default")]
    tokenizer: TokenizerKind,

    /// Emit tracing events for every lex/parse/match step.
    #[arg(long)]
    debug: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TokenizerKind {
    Default,
    Sql,
    Numeric,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("no match");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let grammar_source = std::fs::read_to_string(&args.grammar)
        .with_context(|| format!("reading grammar file {}", args.grammar.display()))?;

    let input = match (&args.input, &args.input_file) {
        (Some(input), None) => input.clone(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).with_context(|| format!("reading input file {}", path.display()))?
        }
        _ => anyhow::bail!("exactly one of --input or --input-file must be given"),
    };

    let tokenizer: Box<dyn tokex::Tokenizer> = match args.tokenizer {
        TokenizerKind::Default => Box::new(DefaultTokenizer::default()),
        TokenizerKind::Sql => Box::new(SqlTokenizer::default()),
        TokenizerKind::Numeric => Box::new(NumericTokenizer::default()),
    };

    let compiled = tokex::compile(&grammar_source, args.allow_sub_grammars, tokenizer, default_flags())
        .map_err(|e| anyhow::anyhow!(e.render()))
        .context("compiling grammar")?;

    match compiled.match_str(&input, args.entire, args.debug) {
        Some(captured) => {
            println!("{}", serde_json::to_string_pretty(&captured)?);
            Ok(true)
        }
        None => Ok(false),
    }
}
