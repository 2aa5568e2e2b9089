use std::collections::{BTreeSet, HashSet};

/// Names the parser has seen during a single pass: declared variables,
/// declared labels, and labels referenced by GOTO.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashSet<String>,
    labels_declared: HashSet<String>,
    labels_gotoed: BTreeSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_variable(&mut self, name: &str) {
        if !self.symbols.contains(name) {
            self.symbols.insert(name.to_string());
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    /// Records a label. Returns `false` when the label was already declared.
    pub fn declare_label(&mut self, name: &str) -> bool {
        self.labels_declared.insert(name.to_string())
    }

    pub fn record_goto(&mut self, name: &str) {
        self.labels_gotoed.insert(name.to_string());
    }

    /// GOTO targets with no matching LABEL, in sorted order.
    pub fn unresolved_gotos(&self) -> impl Iterator<Item = &str> {
        self.labels_gotoed
            .iter()
            .filter(|label| !self.labels_declared.contains(*label))
            .map(String::as_str)
    }

    pub fn variable_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels_declared.len()
    }
}
