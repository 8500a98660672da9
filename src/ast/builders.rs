//! Builder Patterns for AST Construction
//!
//! Provides fluent APIs for constructing AST nodes, particularly useful for tests.
//!
//! ## Example
//!
//! ```rust
//! use minilog::ast::builders::{AtomBuilder, ClauseBuilder};
//!
//! // Build an atom: path(X, Y)
//! let atom = AtomBuilder::new("path").var("X").var("Y").build();
//!
//! // Build a clause: path(X, Z) :- path(X, Y), edge(Y, Z).
//! let clause = ClauseBuilder::new("path")
//!     .head_vars(["X", "Z"])
//!     .body_atom("path", |a| a.var("X").var("Y"))
//!     .body_atom("edge", |a| a.var("Y").var("Z"))
//!     .build();
//! ```

use super::{Atom, Clause, ComparisonOp, Literal, QualifiedName, Term};

// ============================================================================
// AtomBuilder
// ============================================================================

/// Builder for constructing [`Atom`] instances
#[derive(Debug, Clone)]
pub struct AtomBuilder {
    relation: QualifiedName,
    args: Vec<Term>,
}

impl AtomBuilder {
    /// Create a new atom builder for the given relation (dotted path)
    pub fn new(relation: &str) -> Self {
        AtomBuilder {
            relation: QualifiedName::from_dotted(relation),
            args: Vec::new(),
        }
    }

    /// Add a variable argument
    pub fn var(mut self, name: impl Into<String>) -> Self {
        self.args.push(Term::Variable(name.into()));
        self
    }

    /// Add an integer constant argument
    pub fn int(mut self, value: i64) -> Self {
        self.args.push(Term::Int(value));
        self
    }

    /// Add a string constant argument
    pub fn string(mut self, value: impl Into<String>) -> Self {
        self.args.push(Term::Str(value.into()));
        self
    }

    /// Add a nil constant argument
    pub fn nil(mut self) -> Self {
        self.args.push(Term::Nil);
        self
    }

    /// Add a placeholder argument (`_`)
    pub fn placeholder(mut self) -> Self {
        self.args.push(Term::Placeholder);
        self
    }

    /// Add a term directly
    pub fn term(mut self, term: Term) -> Self {
        self.args.push(term);
        self
    }

    /// Add multiple variable arguments
    pub fn vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.args.push(Term::Variable(name.into()));
        }
        self
    }

    /// Build the atom
    pub fn build(self) -> Atom {
        Atom::new(self.relation, self.args)
    }
}

// ============================================================================
// ClauseBuilder
// ============================================================================

/// Builder for constructing [`Clause`] instances
#[derive(Debug, Clone)]
pub struct ClauseBuilder {
    head: AtomBuilder,
    body: Vec<Literal>,
}

impl ClauseBuilder {
    /// Create a new clause builder with the given head relation name
    pub fn new(head_relation: &str) -> Self {
        ClauseBuilder {
            head: AtomBuilder::new(head_relation),
            body: Vec::new(),
        }
    }

    /// Set the head variables
    pub fn head_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.head = self.head.vars(vars);
        self
    }

    /// Set the head terms (for heads with constants, etc.)
    pub fn head_terms<I>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = Term>,
    {
        for term in terms {
            self.head = self.head.term(term);
        }
        self
    }

    /// Add a positive body atom, configured through `f`
    pub fn body_atom(mut self, relation: &str, f: impl FnOnce(AtomBuilder) -> AtomBuilder) -> Self {
        let atom = f(AtomBuilder::new(relation)).build();
        self.body.push(Literal::Atom(atom));
        self
    }

    /// Add a negated body atom, configured through `f`
    pub fn negated_atom(
        mut self,
        relation: &str,
        f: impl FnOnce(AtomBuilder) -> AtomBuilder,
    ) -> Self {
        let atom = f(AtomBuilder::new(relation)).build();
        self.body.push(Literal::Negated(atom));
        self
    }

    /// Add a comparison literal
    pub fn comparison(mut self, left: Term, op: ComparisonOp, right: Term) -> Self {
        self.body.push(Literal::Comparison(left, op, right));
        self
    }

    /// Add a body literal directly
    pub fn literal(mut self, literal: Literal) -> Self {
        self.body.push(literal);
        self
    }

    /// Build the clause
    pub fn build(self) -> Clause {
        Clause::new(self.head.build(), self.body)
    }
}
