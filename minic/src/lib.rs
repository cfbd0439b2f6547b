//! Фронтенд маленького C-подобного языка со статической типизацией.
//!
//! ```text
//! исходник -> lexer -> parser -> AST -> semantics -> (генератор кода)
//! ```
//!
//! Каждая стадия отрабатывает целиком до начала следующей. Первая ошибка
//! любой стадии прерывает компиляцию и возвращается как [`CompileError`].

pub mod error;
pub mod ir;
pub mod logger;
pub mod parser;
pub mod semantics;
pub mod span;

pub use error::CompileError;
pub use ir::ast::Program;

/// Полный проход фронтенда. Возвращённое дерево корректно по именам и типам.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    let program = parser::parse(source)?;
    semantics::analyze(&program)?;
    Ok(program)
}
