pub mod analyzer;
pub mod scope;

pub use analyzer::SemanticAnalyzer;
pub use scope::{ScopeStack, Symbol};

use crate::error::CompileError;
use crate::ir::ast;

/// Проверяет программу целиком; первая ошибка прерывает анализ
pub fn analyze(program: &ast::Program) -> Result<(), CompileError> {
    SemanticAnalyzer::new().analyze_program(program)?;
    Ok(())
}
