//! Teeny to C compiler.
//!
//! Source flows through `lexer` -> `parser` (with `symbol_table`) -> `ast`
//! -> `c_codegen`. `compile` runs the whole pipeline; `service` wraps it in
//! the `POST /compile` HTTP handler.

pub mod ast;
pub mod c_codegen;
pub mod error;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod service;
pub mod symbol_table;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use c_codegen::CCodeGen;
use lexer::Lexer;
use parser::Parser;

pub use error::{CompileError, CompileResult};

/// Output of a successful compilation.
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    pub c_code: String,
    pub ast: Value,
}

/// Compiles Teeny source into C source plus the AST record.
///
/// Every call builds its own lexer, parser and generator.
pub fn compile(source: &str) -> CompileResult<Compilation> {
    let parser = Parser::new(Lexer::new(source))?;
    let program = parser.program()?;

    let ast = program.to_record()?;
    let c_code = CCodeGen::new().compile_program(&program)?;
    debug!(bytes = c_code.len(), "generated C code");

    Ok(Compilation { c_code, ast })
}
