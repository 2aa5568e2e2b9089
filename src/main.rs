use clap::{Arg, ArgAction, Command as ClapCommand};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{error, info};

use teenyc::error::CompileError;
use teenyc::lexer::Lexer;
use teenyc::{compile, logging, CompileResult};

fn main() {
    if let Err(e) = run() {
        error!(error = %e, "compilation aborted");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cli() -> ClapCommand {
    ClapCommand::new("teenyc")
        .version("0.1.0")
        .about("Compiles Teeny programs to C")
        .arg(
            Arg::new("input")
                .help("Input .teeny file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("out-dir")
                .short('o')
                .long("out-dir")
                .help("Directory for the generated files")
                .default_value("."),
        )
        .arg(
            Arg::new("c-file")
                .long("c-file")
                .help("Name of the generated C file")
                .default_value("out.c"),
        )
        .arg(
            Arg::new("ast-file")
                .long("ast-file")
                .help("Name of the AST JSON file")
                .default_value("ast.json"),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream instead of compiling")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("build")
                .short('b')
                .long("build")
                .help("Build an executable from the generated C")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cc")
                .long("cc")
                .help("C compiler used with --build")
                .default_value("gcc"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .help("Emit logs as JSON")
                .action(ArgAction::SetTrue),
        )
}

fn run() -> CompileResult<()> {
    let matches = cli().get_matches();

    logging::init(matches.get_count("verbose"), matches.get_flag("log-json"));

    // Arguments with defaults are always present.
    let arg = |name: &str| matches.get_one::<String>(name).cloned().unwrap_or_default();
    let input_file = arg("input");
    let out_dir = arg("out-dir");

    let source = fs::read_to_string(&input_file)?;

    if matches.get_flag("tokens") {
        for token in Lexer::new(&source) {
            let token = token?;
            println!("{:<10} {:?}", token.kind.name(), token.text);
        }
        return Ok(());
    }

    let compilation = compile(&source)?;

    fs::create_dir_all(&out_dir)?;
    let c_file = Path::new(&out_dir).join(arg("c-file"));
    let ast_file = Path::new(&out_dir).join(arg("ast-file"));

    fs::write(&c_file, &compilation.c_code)?;
    fs::write(&ast_file, serde_json::to_string_pretty(&compilation.ast)?)?;
    info!(c_file = %c_file.display(), ast_file = %ast_file.display(), "wrote outputs");

    if matches.get_flag("build") {
        let executable = Path::new(&out_dir).join("out");
        let status = Command::new(arg("cc"))
            .arg(&c_file)
            .arg("-o")
            .arg(&executable)
            .status()?;

        if !status.success() {
            return Err(CompileError::Build(format!(
                "{} exited with {}",
                arg("cc"),
                status
            )));
        }
        info!(executable = %executable.display(), "built executable");
    }

    println!("Successfully compiled {} to {}", input_file, c_file.display());

    Ok(())
}
