use std::collections::HashMap;

use crate::ir::ast::TypeKind;

/// Запись об объявленном имени: переменная, параметр, функция или extern.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// Для функций - тип возврата
    pub ty: TypeKind,
    pub is_function: bool,
    pub params: Vec<TypeKind>,
}

impl Symbol {
    pub fn variable(name: &str, ty: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            ty,
            is_function: false,
            params: Vec::new(),
        }
    }

    pub fn function(name: &str, return_type: TypeKind, params: Vec<TypeKind>) -> Self {
        Self {
            name: name.to_string(),
            ty: return_type,
            is_function: true,
            params,
        }
    }
}

/// Цепочка областей видимости в виде стека. Нижний фрейм - глобальная область,
/// он никогда не снимается. Поиск идёт сверху вниз.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, Symbol>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()] }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
        tracing::trace!(depth = self.depth(), "enter scope");
    }

    pub fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1, "attempted to pop the global scope");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        tracing::trace!(depth = self.depth(), "leave scope");
    }

    /// 0 для глобальной области
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn is_root(&self) -> bool {
        self.depth() == 0
    }

    /// Добавляет символ в текущую область. `false`, если имя там уже есть.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        let Some(frame) = self.frames.last_mut() else {
            return false;
        };
        if frame.contains_key(&symbol.name) {
            return false;
        }
        tracing::trace!(name = %symbol.name, ty = %symbol.ty, "declare");
        frame.insert(symbol.name.clone(), symbol);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
