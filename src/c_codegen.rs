use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ast::{Expression, Program, Statement};
use crate::error::{CodegenError, CodegenResult};
use crate::lexer::TokenType;

const INDENT: &str = "    ";

/// C type a variable is declared with, fixed by its first LET or INPUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType {
    Int,
    Float,
    CharPtr,
}

impl CType {
    pub fn c_name(self) -> &'static str {
        match self {
            CType::Int => "int",
            CType::Float => "float",
            CType::CharPtr => "char*",
        }
    }

    fn scanf_specifier(self) -> &'static str {
        match self {
            CType::Int => "%d",
            _ => "%f",
        }
    }
}

fn binding_power(kind: TokenType) -> u8 {
    match kind {
        TokenType::Asterisk | TokenType::Slash => 3,
        TokenType::Plus | TokenType::Minus => 2,
        _ => 1,
    }
}

/// Lowers a `Program` to a single C translation unit.
///
/// Type inference state lives only for one `compile_program` call, which
/// consumes the generator.
#[derive(Debug, Default)]
pub struct CCodeGen {
    vars_declared: HashMap<String, CType>,
    emitted: HashSet<String>,
    main_code: String,
}

impl CCodeGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile_program(mut self, program: &Program) -> CodegenResult<String> {
        // Variables first assigned inside a block are declared at the top of
        // `main` so later statements outside that block still see them.
        let mut hoisted = Vec::new();
        self.collect_declarations(&program.statements, 1, &mut hoisted)?;
        for (name, c_type) in hoisted {
            self.emit_line(1, &format!("{} {};", c_type.c_name(), name));
            self.emitted.insert(name);
        }

        for statement in &program.statements {
            self.compile_statement(statement, 1)?;
        }

        debug!(
            statements = program.statements.len(),
            variables = self.vars_declared.len(),
            "lowered program to C"
        );

        let mut result = String::new();
        result.push_str("#include <stdio.h>\n\n");
        result.push_str("int main(void) {\n");
        result.push_str(&self.main_code);
        result.push_str("    return 0;\n");
        result.push_str("}\n");
        Ok(result)
    }

    /// Fixes each variable's type at its first LET or INPUT in program order.
    fn collect_declarations(
        &mut self,
        statements: &[Statement],
        depth: usize,
        hoisted: &mut Vec<(String, CType)>,
    ) -> CodegenResult<()> {
        for statement in statements {
            let (name, value) = match statement {
                Statement::Let { name, value } => (name, Some(value)),
                Statement::Input { name } => (name, None),
                Statement::If { body, .. } | Statement::While { body, .. } => {
                    self.collect_declarations(body, depth + 1, hoisted)?;
                    continue;
                }
                _ => continue,
            };
            if self.vars_declared.contains_key(name) {
                continue;
            }

            let c_type = match value {
                Some(value) => self.infer_type(value)?,
                None => CType::Float,
            };
            self.vars_declared.insert(name.clone(), c_type);
            if depth > 1 {
                hoisted.push((name.clone(), c_type));
            }
        }
        Ok(())
    }

    fn emit_line(&mut self, depth: usize, line: &str) {
        for _ in 0..depth {
            self.main_code.push_str(INDENT);
        }
        self.main_code.push_str(line);
        self.main_code.push('\n');
    }

    fn compile_statement(&mut self, statement: &Statement, depth: usize) -> CodegenResult<()> {
        match statement {
            Statement::Print { expression } => {
                let value = self.compile_expression_to_string(expression);
                let line = if self.is_string_expression(expression) {
                    format!("printf(\"%s\\n\", {});", value)
                } else {
                    format!("printf(\"%.2f\\n\", (float)({}));", value)
                };
                self.emit_line(depth, &line);
            }
            Statement::Let { name, value } => {
                let rhs = self.compile_expression_to_string(value);
                if self.emitted.insert(name.clone()) {
                    let c_type = self.declared_type(name)?;
                    self.emit_line(depth, &format!("{} {} = {};", c_type.c_name(), name, rhs));
                } else {
                    self.emit_line(depth, &format!("{} = {};", name, rhs));
                }
            }
            Statement::Input { name } => {
                let c_type = self.declared_type(name)?;
                if self.emitted.insert(name.clone()) {
                    self.emit_line(depth, &format!("{} {};", c_type.c_name(), name));
                }
                self.emit_line(
                    depth,
                    &format!("scanf(\"{}\", &{});", c_type.scanf_specifier(), name),
                );
            }
            Statement::Label { name } => {
                self.emit_line(depth, &format!("{}:;", name));
            }
            Statement::Goto { name } => {
                self.emit_line(depth, &format!("goto {};", name));
            }
            Statement::If { condition, body } => {
                self.compile_block("if", condition, body, depth)?;
            }
            Statement::While { condition, body } => {
                self.compile_block("while", condition, body, depth)?;
            }
        }
        Ok(())
    }

    fn compile_block(
        &mut self,
        keyword: &str,
        condition: &Expression,
        body: &[Statement],
        depth: usize,
    ) -> CodegenResult<()> {
        let condition_str = self.compile_expression_to_string(condition);
        self.emit_line(depth, &format!("{} ({}) {{", keyword, condition_str));
        for statement in body {
            self.compile_statement(statement, depth + 1)?;
        }
        self.emit_line(depth, "}");
        Ok(())
    }

    fn compile_expression_to_string(&self, expression: &Expression) -> String {
        match expression {
            Expression::Num { value } | Expression::Float { value } => value.clone(),
            Expression::String { value } => format!("\"{}\"", value),
            Expression::Var { value } => value.clone(),
            Expression::BinaryOp {
                left,
                operator,
                right,
            } => {
                let precedence = binding_power(operator.kind);
                format!(
                    "{} {} {}",
                    self.compile_operand(left, precedence, false),
                    operator.text,
                    self.compile_operand(right, precedence, true)
                )
            }
        }
    }

    // Parenthesized only when C precedence would otherwise regroup the tree,
    // as with a desugared sign: `a * -2` is `a * (0 - 2)`.
    fn compile_operand(&self, operand: &Expression, parent: u8, is_right: bool) -> String {
        let code = self.compile_expression_to_string(operand);
        match operand {
            Expression::BinaryOp { operator, .. } => {
                let child = binding_power(operator.kind);
                if child < parent || (is_right && child == parent) {
                    format!("({})", code)
                } else {
                    code
                }
            }
            _ => code,
        }
    }

    // Helper function to check if an expression represents a string
    fn is_string_expression(&self, expression: &Expression) -> bool {
        match expression {
            Expression::String { .. } => true,
            Expression::Var { value } => self.vars_declared.get(value) == Some(&CType::CharPtr),
            _ => false,
        }
    }

    fn declared_type(&self, name: &str) -> CodegenResult<CType> {
        self.vars_declared
            .get(name)
            .copied()
            .ok_or_else(|| CodegenError::UntypedVariable {
                name: name.to_string(),
            })
    }

    fn infer_type(&self, expression: &Expression) -> CodegenResult<CType> {
        match expression {
            Expression::String { .. } => Ok(CType::CharPtr),
            Expression::Num { .. } => Ok(CType::Int),
            Expression::Float { .. } | Expression::BinaryOp { .. } => Ok(CType::Float),
            Expression::Var { value } => self.declared_type(value),
        }
    }
}
