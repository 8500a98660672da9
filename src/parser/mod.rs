//! # Datalog Parser
//!
//! Lexes and parses Datalog source code into AST.
//! Handles clauses, facts, atoms with qualified relation names, negation,
//! comparisons, IO directives, and comments (% and /* */).
//!
//! One clause or directive per line:
//!
//! ```text
//! .input graph.edge
//! .output reach
//! reach(X, Y) :- graph.edge(X, Y).
//! reach(X, Z) :- reach(X, Y), graph.edge(Y, Z).
//! ```

use crate::ast::{
    Atom, Clause, ComparisonOp, Directive, DirectiveKind, Literal, Program, QualifiedName, Term,
};
use thiserror::Error;

/// Parse errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed clause
    #[error("invalid clause: {0}")]
    InvalidClause(String),

    /// Malformed atom
    #[error("invalid atom: {0}")]
    InvalidAtom(String),

    /// Malformed term
    #[error("invalid term: {0}")]
    InvalidTerm(String),

    /// Unbalanced parentheses
    #[error("unbalanced parentheses in: {0}")]
    UnbalancedParens(String),

    /// Unterminated string literal
    #[error("unterminated string literal in: {0}")]
    UnterminatedString(String),

    /// Malformed IO directive
    #[error("invalid directive: {0}")]
    InvalidDirective(String),

    /// A relation was used with two different arities
    #[error("relation '{name}' used with arity {found}, previously declared with arity {expected}")]
    ArityMismatch {
        name: QualifiedName,
        expected: usize,
        found: usize,
    },
}

/// Result type for parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Strip block comments (/* ... */) from source text.
/// Comments may nest and are ignored inside string literals. Newlines
/// inside a comment survive so the line-based clause splitter sees the
/// same line structure as the source.
pub fn strip_block_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut stripped = String::with_capacity(source.len());
    let mut depth = 0usize;
    let mut in_string = false;
    // Start of the pending non-comment span
    let mut keep_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' if depth == 0 => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'*') => {
                if depth == 0 {
                    stripped.push_str(&source[keep_from..i]);
                }
                depth += 1;
                i += 2;
                continue;
            }
            b'*' if !in_string && depth > 0 && bytes.get(i + 1) == Some(&b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    stripped.push(' '); // keep tokens separated
                    keep_from = i;
                }
                continue;
            }
            b'\n' if depth > 0 => stripped.push('\n'),
            _ => {}
        }
        i += 1;
    }

    if depth == 0 {
        stripped.push_str(&source[keep_from..]);
    }
    stripped
}

/// Parse a Datalog program (supports % and /* */ comments).
///
/// Relations are registered implicitly: the first occurrence of a
/// qualified name fixes its arity, and any later occurrence with a
/// different arity is an [`ParseError::ArityMismatch`].
pub fn parse_program(source: &str) -> ParseResult<Program> {
    let mut program = Program::new();

    let source = strip_block_comments(source);

    for line in source.lines() {
        let line = line.trim();

        // Skip empty lines and line comments
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        // Strip inline % comments
        let line = if let Some(pos) = find_comment_start(line) {
            line[..pos].trim()
        } else {
            line
        };

        if line.is_empty() {
            continue;
        }

        if line.starts_with('.') {
            let directive = parse_directive(line)?;
            program.add_directive(directive);
            continue;
        }

        let clause = parse_clause(line)?;
        register_relations(&mut program, &clause)?;
        program.add_clause(clause);
    }

    Ok(program)
}

/// Register the head and body atom relations of a freshly parsed clause,
/// checking arity consistency against earlier occurrences.
fn register_relations(program: &mut Program, clause: &Clause) -> ParseResult<()> {
    let mut atoms = vec![&clause.head];
    for literal in &clause.body {
        if let Some(atom) = literal.atom() {
            atoms.push(atom);
        }
    }

    for atom in atoms {
        let expected = program.ensure_relation(atom.relation.clone(), atom.arity());
        if expected != atom.arity() {
            return Err(ParseError::ArityMismatch {
                name: atom.relation.clone(),
                expected,
                found: atom.arity(),
            });
        }
    }
    Ok(())
}

/// Find the start position of a % comment, respecting string literals
fn find_comment_start(line: &str) -> Option<usize> {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        if c == '"' {
            in_string = !in_string;
        } else if c == '%' && !in_string {
            return Some(i);
        }
    }
    None
}

/// Parse an IO directive: `.input name` or `.output name`
fn parse_directive(line: &str) -> ParseResult<Directive> {
    let mut parts = line.split_whitespace();
    let keyword = parts.next().unwrap_or_default();
    let kind = match keyword {
        ".input" => DirectiveKind::Input,
        ".output" => DirectiveKind::Output,
        _ => return Err(ParseError::InvalidDirective(line.to_string())),
    };

    let name = match (parts.next(), parts.next()) {
        (Some(name), None) => name,
        _ => return Err(ParseError::InvalidDirective(line.to_string())),
    };
    if !is_valid_relation_name(name) {
        return Err(ParseError::InvalidDirective(line.to_string()));
    }

    Ok(Directive {
        kind,
        relation: QualifiedName::from_dotted(name),
    })
}

/// Parse a single clause
pub fn parse_clause(line: &str) -> ParseResult<Clause> {
    // Remove the trailing period if present
    let line = line.trim_end_matches('.').trim();

    let parts: Vec<&str> = line.split(":-").collect();

    if parts.len() == 1 {
        // Fact: just a head atom
        let head = parse_atom(parts[0].trim())?;
        return Ok(Clause::new(head, vec![]));
    }

    if parts.len() != 2 {
        return Err(ParseError::InvalidClause(line.to_string()));
    }

    let head = parse_atom(parts[0].trim())?;
    let body = parse_body(parts[1].trim())?;

    if body.is_empty() {
        return Err(ParseError::InvalidClause(line.to_string()));
    }

    Ok(Clause::new(head, body))
}

/// Parse a clause body (atoms, negated atoms, and comparison literals)
fn parse_body(body_str: &str) -> ParseResult<Vec<Literal>> {
    let mut body = Vec::new();

    for part in split_by_comma_outside_parens(body_str)? {
        let part = part.trim();

        if let Some(atom_str) = part.strip_prefix('!') {
            let atom = parse_atom(atom_str.trim())?;
            body.push(Literal::Negated(atom));
        } else if let Some(comparison) = try_parse_comparison(part)? {
            body.push(comparison);
        } else {
            let atom = parse_atom(part)?;
            body.push(Literal::Atom(atom));
        }
    }

    Ok(body)
}

/// Try to parse a comparison literal (X = Y, X != 5, X < Y, etc.).
/// Returns Ok(None) if this is not a comparison.
fn try_parse_comparison(s: &str) -> ParseResult<Option<Literal>> {
    // Multi-char operators must be checked before their single-char prefixes
    let operators = [
        ("!=", ComparisonOp::NotEqual),
        ("<=", ComparisonOp::LessOrEqual),
        (">=", ComparisonOp::GreaterOrEqual),
        ("<", ComparisonOp::LessThan),
        (">", ComparisonOp::GreaterThan),
        ("=", ComparisonOp::Equal),
    ];

    for (op_str, op) in operators {
        if let Some(pos) = find_operator_outside_parens(s, op_str) {
            let left = parse_term(s[..pos].trim())?;
            let right = parse_term(s[pos + op_str.len()..].trim())?;
            return Ok(Some(Literal::Comparison(left, op, right)));
        }
    }

    Ok(None)
}

/// Find the first occurrence of `op` outside parentheses and string
/// literals. Stray closing parens (malformed input) never push the depth
/// below zero.
fn find_operator_outside_parens(s: &str, op: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;

    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }

        if depth == 0 && !in_string && s.is_char_boundary(i) && s[i..].starts_with(op) {
            return Some(i);
        }
    }

    None
}

/// Split by commas at the top level (outside parentheses and strings)
fn split_by_comma_outside_parens(s: &str) -> ParseResult<Vec<&str>> {
    let mut parts = Vec::new();
    let mut paren_depth: i32 = 0;
    let mut in_string = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => paren_depth += 1,
            ')' if !in_string => {
                paren_depth -= 1;
                if paren_depth < 0 {
                    return Err(ParseError::UnbalancedParens(s.to_string()));
                }
            }
            ',' if paren_depth == 0 && !in_string => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if paren_depth != 0 {
        return Err(ParseError::UnbalancedParens(s.to_string()));
    }
    if in_string {
        return Err(ParseError::UnterminatedString(s.to_string()));
    }

    parts.push(&s[start..]);
    Ok(parts)
}

/// Parse an atom like `edge(X, Y)`, `graph.reach(X, 1)`, or a zero-arity
/// atom `flag`
pub fn parse_atom(s: &str) -> ParseResult<Atom> {
    let s = s.trim();

    let Some(open) = s.find('(') else {
        // Zero-arity atom
        if !is_valid_relation_name(s) {
            return Err(ParseError::InvalidAtom(s.to_string()));
        }
        return Ok(Atom::new(QualifiedName::from_dotted(s), vec![]));
    };

    if !s.ends_with(')') {
        return Err(ParseError::UnbalancedParens(s.to_string()));
    }

    let name = s[..open].trim();
    if !is_valid_relation_name(name) {
        return Err(ParseError::InvalidAtom(s.to_string()));
    }

    let args_str = &s[open + 1..s.len() - 1];
    let mut args = Vec::new();
    if !args_str.trim().is_empty() {
        for part in split_by_comma_outside_parens(args_str)? {
            args.push(parse_term(part.trim())?);
        }
    }

    Ok(Atom::new(QualifiedName::from_dotted(name), args))
}

/// Parse a term: variable, placeholder, or constant
pub fn parse_term(s: &str) -> ParseResult<Term> {
    let s = s.trim();

    if s.is_empty() {
        return Err(ParseError::InvalidTerm(s.to_string()));
    }

    if s == "_" {
        return Ok(Term::Placeholder);
    }

    if s == "nil" {
        return Ok(Term::Nil);
    }

    if let Some(stripped) = s.strip_prefix('"') {
        let Some(value) = stripped.strip_suffix('"') else {
            return Err(ParseError::UnterminatedString(s.to_string()));
        };
        if value.contains('"') {
            return Err(ParseError::InvalidTerm(s.to_string()));
        }
        return Ok(Term::Str(value.to_string()));
    }

    if let Ok(value) = s.parse::<i64>() {
        return Ok(Term::Int(value));
    }

    if let Ok(value) = s.parse::<f64>() {
        return Ok(Term::Float(value));
    }

    // Variables start with an uppercase letter
    let mut chars = s.chars();
    if matches!(chars.next(), Some(first) if first.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Ok(Term::Variable(s.to_string()));
    }

    Err(ParseError::InvalidTerm(s.to_string()))
}

/// Check whether `s` is a valid (possibly dotted) relation name:
/// non-empty lowercase-leading identifier segments separated by dots
fn is_valid_relation_name(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fact() {
        let clause = parse_clause("edge(1, 2).").unwrap();
        assert!(clause.is_fact());
        assert_eq!(clause.head.relation.to_string(), "edge");
        assert_eq!(clause.head.args, vec![Term::Int(1), Term::Int(2)]);
    }

    #[test]
    fn test_parse_rule() {
        let clause = parse_clause("reach(X, Z) :- reach(X, Y), edge(Y, Z).").unwrap();
        assert_eq!(clause.head.relation.to_string(), "reach");
        assert_eq!(clause.body.len(), 2);
        assert!(clause.body.iter().all(Literal::is_atom));
    }

    #[test]
    fn test_parse_qualified_names() {
        let clause = parse_clause("reach(X, Y) :- graph.edge(X, Y).").unwrap();
        let atom = clause.body[0].atom().unwrap();
        assert_eq!(atom.relation, QualifiedName::from_dotted("graph.edge"));
    }

    #[test]
    fn test_parse_negation_and_comparison() {
        let clause = parse_clause("safe(X) :- node(X), !bad(X), X != 0.").unwrap();
        assert_eq!(clause.body.len(), 3);
        assert!(matches!(clause.body[1], Literal::Negated(_)));
        assert!(matches!(
            clause.body[2],
            Literal::Comparison(_, ComparisonOp::NotEqual, _)
        ));
    }

    #[test]
    fn test_parse_terms() {
        assert_eq!(parse_term("X").unwrap(), Term::Variable("X".to_string()));
        assert_eq!(parse_term("_").unwrap(), Term::Placeholder);
        assert_eq!(parse_term("nil").unwrap(), Term::Nil);
        assert_eq!(parse_term("-7").unwrap(), Term::Int(-7));
        assert_eq!(parse_term("2.5").unwrap(), Term::Float(2.5));
        assert_eq!(
            parse_term("\"hello\"").unwrap(),
            Term::Str("hello".to_string())
        );
        assert!(parse_term("lowercase").is_err());
    }

    #[test]
    fn test_parse_string_with_comma() {
        let clause = parse_clause("label(X, \"a, b\") :- node(X).").unwrap();
        assert_eq!(clause.head.args[1], Term::Str("a, b".to_string()));
    }

    #[test]
    fn test_parse_directives() {
        let program = parse_program(
            ".input graph.edge\n\
             .output reach\n\
             reach(X, Y) :- graph.edge(X, Y).",
        )
        .unwrap();
        assert_eq!(program.directives().len(), 2);
        assert_eq!(program.directives()[0].kind, DirectiveKind::Input);
        assert_eq!(
            program.directives()[1].relation,
            QualifiedName::from_dotted("reach")
        );
    }

    #[test]
    fn test_parse_comments() {
        let program = parse_program(
            "% line comment\n\
             reach(X, Y) :- edge(X, Y). % trailing\n\
             /* block\n\
                comment */\n\
             reach(X, Z) :- reach(X, Y), edge(Y, Z).",
        )
        .unwrap();
        assert_eq!(program.clauses().len(), 2);
    }

    #[test]
    fn test_relations_registered_with_arity() {
        let program = parse_program("reach(X, Y) :- edge(X, Y).").unwrap();
        assert_eq!(program.relations().len(), 2);
        assert_eq!(program.relation(&"edge".into()).unwrap().arity, 2);
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let err = parse_program("a(X) :- b(X).\na(X, Y) :- b(X), b(Y).").unwrap_err();
        assert!(matches!(err, ParseError::ArityMismatch { .. }));
    }

    #[test]
    fn test_unbalanced_parens_rejected() {
        assert!(parse_clause("edge(X, Y :- node(X).").is_err());
        assert!(parse_clause("edge(X))").is_err());
    }

    #[test]
    fn test_empty_body_rejected() {
        assert!(parse_clause("a(X) :- .").is_err());
    }
}
