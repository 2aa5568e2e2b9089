use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::lexer::Token;

fn token_text<S: Serializer>(token: &Token, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&token.text)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expression {
    Num {
        value: String,
    },
    Float {
        value: String,
    },
    String {
        value: String,
    },
    Var {
        value: String,
    },
    #[serde(rename = "Bin_Op")]
    BinaryOp {
        #[serde(serialize_with = "token_text")]
        operator: Token,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn num(value: impl Into<String>) -> Self {
        Expression::Num {
            value: value.into(),
        }
    }

    pub fn float(value: impl Into<String>) -> Self {
        Expression::Float {
            value: value.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::String {
            value: value.into(),
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expression::Var { value: name.into() }
    }

    pub fn binary(left: Expression, operator: Token, right: Expression) -> Self {
        Expression::BinaryOp {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Statement {
    Print {
        expression: Expression,
    },
    Let {
        #[serde(rename = "name_token")]
        name: String,
        value: Expression,
    },
    Input {
        #[serde(rename = "value")]
        name: String,
    },
    Label {
        #[serde(rename = "value")]
        name: String,
    },
    Goto {
        #[serde(rename = "value")]
        name: String,
    },
    If {
        condition: Expression,
        body: Vec<Statement>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
}

/// Root of the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    /// Structural record of the tree: every node becomes an object with a
    /// `type` field naming its variant.
    pub fn to_record(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenType;
    use serde_json::json;

    #[test]
    fn test_expression_record() {
        let expr = Expression::binary(
            Expression::num("0"),
            Token::synthetic("-", TokenType::Minus),
            Expression::var("x"),
        );
        assert_eq!(
            serde_json::to_value(&expr).unwrap(),
            json!({
                "type": "Bin_Op",
                "operator": "-",
                "left": { "type": "Num", "value": "0" },
                "right": { "type": "Var", "value": "x" },
            })
        );
    }

    #[test]
    fn test_program_record() {
        let program = Program {
            statements: vec![
                Statement::Let {
                    name: "x".to_string(),
                    value: Expression::float("1.5"),
                },
                Statement::While {
                    condition: Expression::binary(
                        Expression::var("x"),
                        Token::synthetic(">", TokenType::Gt),
                        Expression::num("0"),
                    ),
                    body: vec![
                        Statement::Print {
                            expression: Expression::string("tick"),
                        },
                        Statement::Goto {
                            name: "done".to_string(),
                        },
                    ],
                },
                Statement::Label {
                    name: "done".to_string(),
                },
                Statement::Input {
                    name: "y".to_string(),
                },
            ],
        };

        assert_eq!(
            program.to_record().unwrap(),
            json!({
                "type": "Program",
                "statements": [
                    { "type": "Let", "name_token": "x", "value": { "type": "Float", "value": "1.5" } },
                    {
                        "type": "While",
                        "condition": {
                            "type": "Bin_Op",
                            "operator": ">",
                            "left": { "type": "Var", "value": "x" },
                            "right": { "type": "Num", "value": "0" },
                        },
                        "body": [
                            { "type": "Print", "expression": { "type": "String", "value": "tick" } },
                            { "type": "Goto", "value": "done" },
                        ],
                    },
                    { "type": "Label", "value": "done" },
                    { "type": "Input", "value": "y" },
                ],
            })
        );
    }

    #[test]
    fn test_record_is_deterministic() {
        let program = Program {
            statements: vec![Statement::Print {
                expression: Expression::num("7"),
            }],
        };
        let first = serde_json::to_string(&program.to_record().unwrap()).unwrap();
        let second = serde_json::to_string(&program.to_record().unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
