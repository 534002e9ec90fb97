use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordshadow_cli::{ReplCommand, build_engine, load_settings};
use wordshadow_im::{MemoryEditor, SuggestionEngine};

/// Interactive word-suggestion shell over an in-memory editor
#[derive(Parser, Debug)]
#[command(name = "wordshadow-repl")]
#[command(about = "Type, query and pick words against an in-memory editor", long_about = None)]
struct Args {
    /// Word list (TSV or JSON). Defaults to the configured or bundled lexicon
    #[arg(short, long)]
    lexicon: Option<PathBuf>,

    /// Config file to use instead of the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

const HELP: &str = "\
commands:
  start            start a new input (re-reads the editor)
  finish           finish the input, keeping composing text
  query <word>     suggestions for the word typed so far (a bare word works too)
  pick <word>      commit a word and show next-word predictions
  text             show the editor text
  state            show the engine state as JSON
  quit             exit";

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "wordshadow_im=debug,wordshadow_engine=debug"
    } else {
        "wordshadow_im=warn,wordshadow_engine=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let settings = load_settings(args.config.as_deref())?;
    let editor = MemoryEditor::new();
    let engine = build_engine(&editor, args.lexicon.as_deref(), settings)?;

    println!("wordshadow repl - type 'help' for commands");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match ReplCommand::parse(&line) {
            Ok(ReplCommand::Quit) => break,
            Ok(command) => run(&engine, &editor, command)?,
            Err(e) => println!("{}", e),
        }
    }

    engine.release();
    Ok(())
}

fn run(engine: &SuggestionEngine, editor: &MemoryEditor, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Start => engine.start_input(None),
        ReplCommand::Finish => engine.finish_input(),
        ReplCommand::Query(word) => print_words(&engine.query(&word)),
        ReplCommand::Pick(word) => {
            let next = engine.pick(&word);
            println!("text: {:?}", editor.text());
            print_words(&next);
        }
        ReplCommand::Text => println!("{:?}", editor.text()),
        ReplCommand::State => match engine.snapshot() {
            Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            None => println!("(no state: engine did not answer)"),
        },
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => {}
    }
    Ok(())
}

fn print_words(words: &[String]) {
    if words.is_empty() {
        println!("(no suggestions)");
    } else {
        for (i, word) in words.iter().enumerate() {
            println!("{:2}. {}", i + 1, word);
        }
    }
}
