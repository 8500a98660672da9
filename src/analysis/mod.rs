//! # Program Analyses
//!
//! Lightweight analyses computed over a parsed program and consumed by the
//! transformations. Currently only the IO-directive analysis lives here.

use crate::ast::{Program, QualifiedName};
use std::collections::HashSet;

/// IO-directive analysis: which relations participate in the program's
/// external inputs or outputs.
///
/// IO relations are part of the program's external contract, so
/// transformations that remove or rename relations must leave them alone.
#[derive(Debug, Clone, Default)]
pub struct IoTypes {
    io_relations: HashSet<QualifiedName>,
}

impl IoTypes {
    /// Collect the IO relation set from the program's directives
    pub fn analyse(program: &Program) -> Self {
        let io_relations = program
            .directives()
            .iter()
            .map(|directive| directive.relation.clone())
            .collect();
        IoTypes { io_relations }
    }

    /// Check whether the named relation is marked as input or output
    pub fn is_io(&self, name: &QualifiedName) -> bool {
        self.io_relations.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn test_io_types_from_directives() {
        let program = parse_program(
            ".input edge\n\
             .output reach\n\
             reach(X, Y) :- edge(X, Y).\n\
             helper(X) :- edge(X, _).",
        )
        .unwrap();
        let io_types = IoTypes::analyse(&program);

        assert!(io_types.is_io(&"edge".into()));
        assert!(io_types.is_io(&"reach".into()));
        assert!(!io_types.is_io(&"helper".into()));
    }

    #[test]
    fn test_io_types_empty_without_directives() {
        let program = parse_program("a(X) :- b(X).").unwrap();
        let io_types = IoTypes::analyse(&program);
        for relation in program.relations() {
            assert!(!io_types.is_io(&relation.name));
        }
    }
}
