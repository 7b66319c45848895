use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::lox::scan;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::Lox;

#[derive(ClapParser, Debug)]
#[command(name = "lox", version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a program and prints its AST
    Parse {
        filename: PathBuf,

        /// Print the AST as JSON
        #[arg(long)]
        json: bool,
    },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive session (the default); `:q` quits
    Repl,
}

/// Reads the contents of a file as UTF‑8 text
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let text = String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Prints every error and exits with the status of the first.
fn fail(errors: &[LoxError]) -> ! {
    for e in errors {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }

    let code = errors.first().map_or(65, LoxError::exit_code);
    debug!("Exiting with code {}", code);
    std::process::exit(code);
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Some(Commands::Tokenize { filename, json }) => {
            info!("Running Tokenize subcommand");
            let source = read_file(&filename)?;
            let mut errors = Vec::new();
            let mut tokens = Vec::new();

            for result in Scanner::new(&source) {
                match result {
                    Ok(token) if json => tokens.push(token),
                    Ok(token) => println!("{}", token),
                    Err(e) => {
                        eprintln!("{}", e);
                        errors.push(e);
                    }
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            }

            if !errors.is_empty() {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }
        }

        Some(Commands::Parse { filename, json }) => {
            info!("Running Parse subcommand");
            let source = read_file(&filename)?;
            let tokens = scan(&source).unwrap_or_else(|errors| fail(&errors));

            let statements = Parser::new(&tokens)
                .parse()
                .unwrap_or_else(|errors| fail(&errors));

            if json {
                println!("{}", serde_json::to_string_pretty(&statements)?);
            } else {
                println!("{}", AstPrinter::print_program(&statements));
            }
        }

        Some(Commands::Run { filename }) => {
            info!("Running Run subcommand");
            let source = read_file(&filename)?;
            debug!("Provided input:\n {}", source);

            let mut lox = Lox::new();

            if let Err(errors) = lox.run(&source) {
                fail(&errors);
            }

            info!("Program executed successfully");
        }

        Some(Commands::Repl) | None => {
            let mut lox = Lox::new();
            let stdin = io::stdin();

            lox.run_prompt(stdin.lock(), &mut io::stdout(), &mut io::stderr())
                .context("REPL I/O failed")?;
        }
    }

    Ok(())
}
