// The litex CLI.
// You can check source files, or run statements interactively.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use litex::config::{CheckerConfig, RunnerConfig};
use litex::interpreter::Session;
use litex::runner::{is_complete, RunOutput, Runner};
use mimalloc::MiMalloc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(
    name = "litex",
    about = "Checks facts and proofs in a small logic language",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// How deeply checks may nest before giving up
    #[clap(long, global = true, default_value_t = CheckerConfig::default().max_depth)]
    max_depth: usize,

    /// Never answer False by proving the negation of an unknown goal
    #[clap(long, global = true)]
    no_fallback: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check source files, or every .lix file under a directory
    Check {
        #[clap(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Print the per-statement reports as JSON
        #[clap(long)]
        json: bool,

        /// Stop at the first statement that errors
        #[clap(long)]
        fail_fast: bool,
    },

    /// Read statements from stdin and run them as they complete
    Repl,
}

fn print_output(output: &RunOutput) {
    for line in output.lines() {
        println!("{}", line);
    }
}

fn repl(runner: &Runner, checker: CheckerConfig) {
    let mut session = Session::new(checker);
    let stdin = std::io::stdin();
    let mut buffer = String::new();
    print!("> ");
    let _ = std::io::stdout().flush();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                println!("error reading input: {}", e);
                std::process::exit(1);
            }
        };
        buffer.push_str(&line);
        buffer.push('\n');
        if is_complete(&buffer) {
            let output = runner.run_in(&mut session, &buffer);
            print_output(&output);
            buffer.clear();
            print!("> ");
        } else {
            print!(". ");
        }
        let _ = std::io::stdout().flush();
    }
}

fn main() {
    // Use RUST_LOG to control log levels, e.g.:
    //   RUST_LOG=litex::checker=trace litex check demo.lix
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let checker = CheckerConfig {
        max_depth: args.max_depth,
        polarity_fallback: !args.no_fallback,
    };

    match args.command {
        Command::Check {
            paths,
            json,
            fail_fast,
        } => {
            let runner = Runner::new(RunnerConfig { checker, fail_fast });
            let mut outputs = vec![];
            for path in &paths {
                match runner.run_path(path) {
                    Ok(mut found) => outputs.append(&mut found),
                    Err(e) => {
                        println!("{}", e);
                        std::process::exit(1);
                    }
                }
            }
            if json {
                match serde_json::to_string_pretty(&outputs) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        println!("error writing json: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                for output in &outputs {
                    print_output(output);
                }
            }
            if outputs.iter().any(|output| !output.is_success()) {
                std::process::exit(1);
            }
        }

        Command::Repl => {
            let runner = Runner::new(RunnerConfig {
                checker: checker.clone(),
                fail_fast: false,
            });
            repl(&runner, checker);
        }
    }
}
