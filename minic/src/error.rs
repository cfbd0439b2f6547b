use thiserror::Error;

use crate::ir::ast::{Operator, TypeKind};
use crate::span::Span;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span}: {kind}")]
    LexerError { span: Span, kind: LexErrorKind },

    #[error("Syntax error at {span}: {message}")]
    SyntaxError { span: Span, message: String },

    #[error("Semantic error: {0}")]
    SemanticError(#[from] SemanticError),

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Стадия, на которой упала компиляция
    pub fn stage(&self) -> &'static str {
        match self {
            CompileError::LexerError { .. } => "lexer",
            CompileError::SyntaxError { .. } => "parser",
            CompileError::SemanticError(_) => "semantics",
            CompileError::IoError { .. } => "io",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("unterminated string")]
    UnterminatedString,

    #[error("unterminated char")]
    UnterminatedChar,

    #[error("unknown operator: {0}")]
    UnknownOperator(char),
}

/// Что именно было объявлено повторно
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRole {
    Function,
    Extern,
    Parameter,
    Variable,
}

impl std::fmt::Display for SymbolRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolRole::Function => "function",
            SymbolRole::Extern => "external declaration",
            SymbolRole::Parameter => "parameter",
            SymbolRole::Variable => "variable",
        };
        f.write_str(name)
    }
}

/// Где обнаружено несовпадение типов
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchContext {
    VariableDeclaration(String),
    Assignment(String),
    Return,
    Argument { callee: String, position: usize },
}

impl std::fmt::Display for MismatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchContext::VariableDeclaration(name) => {
                write!(f, "variable declaration of {}", name)
            }
            MismatchContext::Assignment(name) => write!(f, "assignment to {}", name),
            MismatchContext::Return => f.write_str("return statement"),
            MismatchContext::Argument { callee, position } => {
                write!(f, "argument {} of call to {}", position + 1, callee)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    #[error("undefined function {0}")]
    UndefinedFunction(String),

    #[error("redefinition of {what} {name}")]
    Redefinition { what: SymbolRole, name: String },

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: MismatchContext,
        expected: TypeKind,
        found: TypeKind,
    },

    #[error("type mismatch in binary expression: {left} {} {right}", .op.lexeme())]
    OperandMismatch {
        op: Operator,
        left: TypeKind,
        right: TypeKind,
    },

    #[error("invalid operand type {found} for operator {}", .op.lexeme())]
    InvalidOperand { op: Operator, found: TypeKind },

    #[error("void value used in expression")]
    VoidValue,

    #[error("argument count mismatch in call to {name}: expected {expected}, found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("call to non-function {0}")]
    CallToNonFunction(String),

    #[error("cannot assign to function {0}")]
    AssignToFunction(String),

    #[error("external declaration {0} must be at the top level")]
    ExternNotAtTopLevel(String),

    #[error("{construct} condition must be boolean, found {found}")]
    NonBooleanCondition {
        construct: &'static str,
        found: TypeKind,
    },

    #[error("return statement expected a value of type {expected}")]
    MissingReturnValue { expected: TypeKind },

    #[error("void function cannot return a value of type {found}")]
    UnexpectedReturnValue { found: TypeKind },

    #[error("return statement outside of function")]
    ReturnOutsideFunction,
}
