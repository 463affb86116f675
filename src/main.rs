use std::path::PathBuf;

use clap::Parser;
use mimalloc::MiMalloc;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use lemma_builder::config::config::load_config;
use lemma_builder::pipeline::pipeline::LemmaPipeline;
use lemma_builder::resolver::interrupt::InterruptHandler;
use lemma_builder::resolver::key_source::{
    ReadlineKeySource, bind_review_keys, unbind_review_keys,
};
use lemma_builder::resolver::view::{TerminalView, render_statistics};

#[derive(Parser, Debug)]
#[command(name = "lemma_builder")]
#[command(about = "Builds and reviews a word -> lemma dictionary")]
struct Args {
    /// JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn print_help() {
    println!("The valid commands are->");
    println!("build: Reads the sources, reduces the graph and saves the dataset");
    println!("stats: Shows how many words are still ambiguous");
    println!("resolve: Starts (or resumes) the review of ambiguous words");
    println!("export: Writes the two dictionary files");
    println!("lookup [word]: Looks a word up in the exported dictionary");
    println!("quit: Leaves the program");
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();
    let config = load_config(&args.config);

    println!("\nCurrent Configuration:");
    println!("  Language:          {}", config.language);
    println!("  Source Directory:  {}", config.source_dir);
    println!("  Data Directory:    {}", config.data_dir);
    println!("  Dataset:           {}", config.dataset);
    println!("  Output Directory:  {}", config.output_dir);
    println!("  Reduction Passes:  {}", config.reduction_passes);
    println!("\nType 'help' for commands or 'quit' to leave.\n");

    let mut pipeline = match LemmaPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("⚠ {}", e);
            return;
        }
    };

    let interrupts = match InterruptHandler::install() {
        Ok(handler) => Some(handler),
        Err(e) => {
            warn!("could not install the interrupt handler: {}", e);
            None
        }
    };

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("⚠ could not open the terminal: {}", e);
            return;
        }
    };

    loop {
        let readline = rl.readline("> ");

        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let parts: Vec<&str> = line.split_whitespace().collect();
                let command = parts[0];

                match command {
                    "help" => print_help(),
                    "build" => match pipeline.build() {
                        Ok(report) => {
                            println!(
                                "{} pairs kept ({} rejected, {} duplicates, {} unreadable sources)",
                                report.pairs,
                                report.ingest.rejected,
                                report.ingest.duplicates,
                                report.ingest.failed_sources
                            );
                            if !report.reduction.is_converged() {
                                println!(
                                    "⚠ {} words still change after {} passes",
                                    report.reduction.unstable_words.len(),
                                    report.reduction.passes
                                );
                            }
                            print!("{}", render_statistics(&report.statistics));
                            println!("Dataset saved to {:?}", report.dataset_path);
                        }
                        Err(e) => println!("⚠ {}", e),
                    },
                    "stats" => match pipeline.statistics() {
                        Ok(stats) => print!("{}", render_statistics(&stats)),
                        Err(e) => println!("⚠ {}", e),
                    },
                    "resolve" => {
                        let cancel = interrupts.as_ref().map(InterruptHandler::begin_review);
                        bind_review_keys(&mut rl);
                        let result = {
                            let mut keys = ReadlineKeySource::new(&mut rl, "lemma> ");
                            let mut view = TerminalView::stdout();
                            pipeline.resolve(&mut keys, &mut view, cancel)
                        };
                        unbind_review_keys(&mut rl);
                        if let Some(handler) = &interrupts {
                            handler.end_review();
                        }
                        if let Err(e) = result {
                            println!("⚠ {}", e);
                        }
                    }
                    "export" => match pipeline.export() {
                        Ok(written) => println!(
                            "{} rows written to {:?} and {:?}",
                            written.rows, written.word_lemma_path, written.lemma_word_path
                        ),
                        Err(e) => println!("⚠ {}", e),
                    },
                    "lookup" => {
                        let Some(word) = parts.get(1) else {
                            println!("usage: lookup [word]");
                            continue;
                        };
                        match pipeline.lookup() {
                            Ok(lookup) => match lookup.get(&word.to_lowercase()) {
                                Some(lemmas) => {
                                    let mut lemmas: Vec<&String> = lemmas.iter().collect();
                                    lemmas.sort();
                                    for lemma in lemmas {
                                        println!("{} -> {}", word, lemma);
                                    }
                                }
                                None => println!("{} is not in the dictionary", word),
                            },
                            Err(e) => println!("⚠ {}", e),
                        }
                    }
                    "quit" | "exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {
                        println!(
                            "Invalid command. Type help if you want to see the valid commands"
                        );
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
}
