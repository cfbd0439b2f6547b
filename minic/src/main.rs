use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use minic::logger::{self, LogLevel};
use minic::parser::lexer::{Lexer, TokenKind};
use minic::{CompileError, parser};

#[derive(Parser)]
#[command(name = "minic")]
#[command(about = "Front end for a small statically typed C-like language", version)]
struct Cli {
    /// Уровень логирования
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Показать поток токенов
    Lex {
        /// Исходник
        input: String,
    },

    /// Распарсить и показать ast без проверки типов
    Parse {
        /// Исходник
        input: String,
    },

    /// Полная проверка: лексер, парсер, семантика
    Check {
        /// Исходник
        input: String,

        /// Показать ast
        #[arg(long)]
        show_ast: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_with_level(cli.log_level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(stage = e.stage(), "compilation failed");
            eprintln!("error[{}]: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CompileError> {
    match command {
        Commands::Lex { input } => {
            let source = fs::read_to_string(&input)?;

            // лениво, токен за токеном, как читает парсер
            let mut lexer = Lexer::new(&source);
            loop {
                let token = lexer.next_token()?;
                println!("{}", token.kind);
                if token.kind == TokenKind::Eof {
                    break;
                }
            }
        }
        Commands::Parse { input } => {
            let source = fs::read_to_string(&input)?;
            let program = parser::parse(&source)?;

            println!("Parse successful!");
            println!("Top-level items: {}", program.items.len());
            print!("{}", program);
        }
        Commands::Check { input, show_ast } => {
            let source = fs::read_to_string(&input)?;
            let program = minic::compile(&source)?;

            println!("Semantic analysis successful!");
            if show_ast {
                println!("=== AST ===");
                print!("{}", program);
            }
        }
    }

    Ok(())
}
