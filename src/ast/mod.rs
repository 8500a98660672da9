//! # Datalog AST - Abstract Syntax Tree Types
//!
//! Abstract Syntax Tree types for Datalog programs.
//! Used across parsing, analysis, and the program transformations.
//!
//! A program owns an ordered set of relations, an ordered set of clauses,
//! and the IO directives attached to relations. Clauses are rules
//! `head :- lit, ..., lit.`; facts are clauses with an empty body.
//!
//! ## Builders
//!
//! For programmatic construction of AST nodes, see the [`builders`] module
//! which provides fluent APIs like `AtomBuilder` and `ClauseBuilder`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub mod builders;

// ============================================================================
// Qualified names
// ============================================================================

/// A dotted identifier path uniquely naming a relation, e.g. `graph.edge`.
///
/// # Examples
/// ```
/// use minilog::ast::QualifiedName;
///
/// let name = QualifiedName::from_dotted("graph.edge");
/// assert_eq!(name.to_string(), "graph.edge");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// Create a qualified name from its segments
    pub fn new(segments: Vec<String>) -> Self {
        QualifiedName { segments }
    }

    /// Parse a dotted path like `graph.edge` into a qualified name
    pub fn from_dotted(path: &str) -> Self {
        QualifiedName {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    /// The identifier segments of this name
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for QualifiedName {
    fn from(path: &str) -> Self {
        QualifiedName::from_dotted(path)
    }
}

// ============================================================================
// Terms
// ============================================================================

/// Represents a variable or constant argument of an atom
///
/// # Examples
/// ```
/// use minilog::ast::Term;
///
/// let var = Term::Variable("X".to_string());
/// let num = Term::Int(42);
/// let wildcard = Term::Placeholder; // "_" in concrete syntax
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A named variable, e.g. "X", "Count"
    Variable(String),
    /// Integer constant
    Int(i64),
    /// Float constant
    Float(f64),
    /// String constant
    Str(String),
    /// The nil constant
    Nil,
    /// Anonymous variable ("_"); each occurrence is distinct
    Placeholder,
}

impl Term {
    /// Check if this term is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Check if this term is a constant (int, float, string, or nil)
    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Int(_) | Term::Float(_) | Term::Str(_) | Term::Nil)
    }

    /// Get variable name if this is a variable
    pub fn as_variable(&self) -> Option<&str> {
        if let Term::Variable(name) = self {
            Some(name)
        } else {
            None
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "{name}"),
            Term::Int(v) => write!(f, "{v}"),
            Term::Float(v) => write!(f, "{v}"),
            Term::Str(s) => write!(f, "\"{s}\""),
            Term::Nil => write!(f, "nil"),
            Term::Placeholder => write!(f, "_"),
        }
    }
}

// ============================================================================
// Atoms and literals
// ============================================================================

/// Represents an atom like `edge(X, Y)` or `graph.reach(X)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub relation: QualifiedName,
    pub args: Vec<Term>,
}

impl Atom {
    /// Create a new atom
    pub fn new(relation: QualifiedName, args: Vec<Term>) -> Self {
        Atom { relation, args }
    }

    /// Get the arity (number of arguments) of this atom
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Invoke `f` on every variable name in this atom, in argument order
    pub fn visit_variables(&self, f: &mut impl FnMut(&str)) {
        for term in &self.args {
            if let Term::Variable(name) = term {
                f(name);
            }
        }
    }

    /// Get all variable names in this atom
    pub fn variables(&self) -> HashSet<String> {
        let mut vars = HashSet::new();
        self.visit_variables(&mut |name| {
            vars.insert(name.to_string());
        });
        vars
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relation)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Comparison operators usable in clause bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl ComparisonOp {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        }
    }
}

/// Represents a body literal: a positive atom, a negated atom, or a
/// comparison constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Atom(Atom),
    Negated(Atom),
    Comparison(Term, ComparisonOp, Term),
}

impl Literal {
    /// Get the underlying atom, if this literal is atomic
    pub fn atom(&self) -> Option<&Atom> {
        match self {
            Literal::Atom(atom) | Literal::Negated(atom) => Some(atom),
            Literal::Comparison(_, _, _) => None,
        }
    }

    /// Check if this is a positive atom
    pub fn is_atom(&self) -> bool {
        matches!(self, Literal::Atom(_))
    }

    /// Invoke `f` on every variable name in this literal
    pub fn visit_variables(&self, f: &mut impl FnMut(&str)) {
        match self {
            Literal::Atom(atom) | Literal::Negated(atom) => atom.visit_variables(f),
            Literal::Comparison(left, _, right) => {
                for term in [left, right] {
                    if let Term::Variable(name) = term {
                        f(name);
                    }
                }
            }
        }
    }

    /// Rewrite every atom node in this literal bottom-up with `f`
    fn map_atoms(self, f: &mut impl FnMut(Atom) -> Atom) -> Self {
        match self {
            Literal::Atom(atom) => Literal::Atom(f(atom)),
            Literal::Negated(atom) => Literal::Negated(f(atom)),
            Literal::Comparison(_, _, _) => self,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Atom(atom) => write!(f, "{atom}"),
            Literal::Negated(atom) => write!(f, "!{atom}"),
            Literal::Comparison(left, op, right) => {
                write!(f, "{left} {} {right}", op.as_str())
            }
        }
    }
}

// ============================================================================
// Clauses
// ============================================================================

/// Represents a single Datalog clause
///
/// # Examples
/// ```text
/// reach(X, Z) :- reach(X, Y), edge(Y, Z).
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub head: Atom,
    pub body: Vec<Literal>,
}

impl Clause {
    /// Create a new clause
    pub fn new(head: Atom, body: Vec<Literal>) -> Self {
        Clause { head, body }
    }

    /// Check if this clause is a fact (empty body)
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    /// Invoke `f` on every variable name in this clause, head first then
    /// body literals in order
    pub fn visit_variables(&self, f: &mut impl FnMut(&str)) {
        self.head.visit_variables(f);
        for literal in &self.body {
            literal.visit_variables(f);
        }
    }

    /// Get all distinct variable names in this clause
    pub fn variables(&self) -> HashSet<String> {
        let mut vars = HashSet::new();
        self.visit_variables(&mut |name| {
            vars.insert(name.to_string());
        });
        vars
    }

    /// Rewrite every atom node in this clause bottom-up with `f`,
    /// head included
    pub fn map_atoms(self, f: &mut impl FnMut(Atom) -> Atom) -> Self {
        let head = f(self.head);
        let mut body = Vec::with_capacity(self.body.len());
        for literal in self.body {
            body.push(literal.map_atoms(f));
        }
        Clause { head, body }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            for (i, literal) in self.body.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{literal}")?;
            }
        }
        write!(f, ".")
    }
}

// ============================================================================
// Relations and directives
// ============================================================================

/// A relation declaration: qualified name plus fixed arity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub name: QualifiedName,
    pub arity: usize,
}

impl Relation {
    /// Create a new relation
    pub fn new(name: QualifiedName, arity: usize) -> Self {
        Relation { name, arity }
    }
}

/// Kind of an IO directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectiveKind {
    Input,
    Output,
}

/// An IO directive marking a relation as external input or output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub relation: QualifiedName,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.kind {
            DirectiveKind::Input => ".input",
            DirectiveKind::Output => ".output",
        };
        write!(f, "{keyword} {}", self.relation)
    }
}

// ============================================================================
// Programs
// ============================================================================

/// Represents a complete Datalog program: relations, clauses, and
/// IO directives, all in deterministic (insertion) order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    relations: Vec<Relation>,
    clauses: Vec<Clause>,
    directives: Vec<Directive>,
}

impl Program {
    /// Create a new empty program
    pub fn new() -> Self {
        Program::default()
    }

    /// All relations, in declaration order
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// All clauses, in source order
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// All IO directives, in source order
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Look up a relation by qualified name
    pub fn relation(&self, name: &QualifiedName) -> Option<&Relation> {
        self.relations.iter().find(|rel| rel.name == *name)
    }

    /// Register a relation if not yet known. Returns the arity the
    /// relation is registered with (an existing declaration wins).
    pub fn ensure_relation(&mut self, name: QualifiedName, arity: usize) -> usize {
        if let Some(rel) = self.relations.iter().find(|rel| rel.name == name) {
            return rel.arity;
        }
        self.relations.push(Relation::new(name, arity));
        arity
    }

    /// Add a clause to the program
    pub fn add_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Add an IO directive
    pub fn add_directive(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// Replace the clause at `index`
    pub fn replace_clause(&mut self, index: usize, clause: Clause) {
        self.clauses[index] = clause;
    }

    /// Remove the clauses at the given indices, preserving the order of
    /// the remaining clauses
    pub fn remove_clauses_at(&mut self, indices: &HashSet<usize>) {
        if indices.is_empty() {
            return;
        }
        let mut index = 0;
        self.clauses.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
    }

    /// Remove a relation declaration. Returns true if it existed.
    /// The caller is responsible for removing its clauses and rewriting
    /// any remaining references first.
    pub fn remove_relation(&mut self, name: &QualifiedName) -> bool {
        let before = self.relations.len();
        self.relations.retain(|rel| rel.name != *name);
        self.relations.len() < before
    }

    /// The defining clauses of a relation, in source order
    pub fn clauses_of(&self, name: &QualifiedName) -> Vec<&Clause> {
        self.clauses
            .iter()
            .filter(|clause| clause.head.relation == *name)
            .collect()
    }

    /// Invoke `f` on every variable name in the program
    pub fn visit_variables(&self, f: &mut impl FnMut(&str)) {
        for clause in &self.clauses {
            clause.visit_variables(f);
        }
    }

    /// Rewrite every atom node in the program bottom-up with `f`.
    /// Visits heads as well as body atoms, including atoms under negation.
    pub fn map_atoms(&mut self, f: &mut impl FnMut(Atom) -> Atom) {
        let clauses = std::mem::take(&mut self.clauses);
        let mut mapped = Vec::with_capacity(clauses.len());
        for clause in clauses {
            mapped.push(clause.map_atoms(f));
        }
        self.clauses = mapped;
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in &self.directives {
            writeln!(f, "{directive}")?;
        }
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}
