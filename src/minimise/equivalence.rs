//! Bijective equivalence of restricted Datalog clauses.
//!
//! Two clauses are bijectively equivalent iff some permutation of body
//! atoms plus a one-to-one renaming of variables makes them structurally
//! identical, with constants compared by value. The decision procedure
//! only covers a restricted fragment (atomic body literals, variable or
//! constant arguments); everything outside the fragment is conservatively
//! reported as non-equivalent, even to itself.
//!
//! Head atoms are pinned to each other but their relation names are *not*
//! compared: singleton-relation merging relies on detecting equivalence
//! between clauses of differently-named relations.

use crate::ast::{Atom, Clause, Literal, Term};
use std::collections::HashMap;

/// Check whether a clause falls in the decidable fragment: every body
/// literal is a positive atom and every argument anywhere in the clause
/// is a variable or a constant.
pub fn is_supported(clause: &Clause) -> bool {
    let atom_supported =
        |atom: &Atom| atom.args.iter().all(|t| t.is_variable() || t.is_constant());

    atom_supported(&clause.head)
        && clause.body.iter().all(|literal| match literal {
            Literal::Atom(atom) => atom_supported(atom),
            Literal::Negated(_) | Literal::Comparison(_, _, _) => false,
        })
}

/// Extract all valid permutations from a boolean compatibility matrix.
///
/// Returns every permutation `perm` of `{0..n-1}` such that
/// `matrix[i][perm[i]]` holds for all `i`. Emission order is DFS order:
/// deterministic for a given matrix.
pub fn valid_permutations(matrix: &[Vec<bool>]) -> Vec<Vec<usize>> {
    let size = matrix.len();
    let mut permutations = Vec::new();
    let mut current = Vec::with_capacity(size);
    let mut used = vec![false; size];
    search(matrix, &mut current, &mut used, &mut permutations);
    permutations
}

/// DFS over matrix rows, extending `current` with one unused compatible
/// column per row
fn search(
    matrix: &[Vec<bool>],
    current: &mut Vec<usize>,
    used: &mut [bool],
    permutations: &mut Vec<Vec<usize>>,
) {
    let row = current.len();
    if row == matrix.len() {
        permutations.push(current.clone());
        return;
    }

    for (column, &compatible) in matrix[row].iter().enumerate() {
        if compatible && !used[column] {
            used[column] = true;
            current.push(column);
            search(matrix, current, used, permutations);
            current.pop();
            used[column] = false;
        }
    }
}

/// The body atom at `index`, which the caller has established to be
/// atomic via [`is_supported`]
fn body_atom(clause: &Clause, index: usize) -> &Atom {
    match &clause.body[index] {
        Literal::Atom(atom) => atom,
        _ => unreachable!("supported clause has only atomic body literals"),
    }
}

/// Check whether a consistent variable mapping exists between `left` and
/// `right` under the given atom placement.
///
/// `placement[p]` names the left-clause atom (0 = head, k = body atom
/// k-1) that lands at position p of the right clause; `placement[0]` is
/// always 0. Arguments are compared positionally: variables extend or
/// confirm the left-to-right renaming map, constants must be equal by
/// value. The map is only checked for left-functionality; together with
/// the caller's distinct-variable-count gate that makes it a bijection.
fn mapping_exists(left: &Clause, right: &Clause, placement: &[usize]) -> bool {
    let mut renaming: HashMap<&str, &str> = HashMap::new();

    for (position, &source) in placement.iter().enumerate() {
        let left_atom = if source == 0 {
            &left.head
        } else {
            body_atom(left, source - 1)
        };
        let right_atom = if position == 0 {
            &right.head
        } else {
            body_atom(right, position - 1)
        };

        if left_atom.arity() != right_atom.arity() {
            return false;
        }

        for (left_arg, right_arg) in left_atom.args.iter().zip(&right_atom.args) {
            let consistent = match (left_arg, right_arg) {
                (Term::Variable(left_name), Term::Variable(right_name)) => {
                    match renaming.insert(left_name.as_str(), right_name.as_str()) {
                        None => true,
                        Some(previous) => previous == right_name.as_str(),
                    }
                }
                (Term::Int(l), Term::Int(r)) => l == r,
                (Term::Float(l), Term::Float(r)) => l == r,
                (Term::Str(l), Term::Str(r)) => l == r,
                (Term::Nil, Term::Nil) => true,
                // Mixed kinds, or argument types outside the fragment
                _ => false,
            };
            if !consistent {
                return false;
            }
        }
    }

    true
}

/// Check whether two clauses are bijectively equivalent.
///
/// Sound but intentionally incomplete: clauses outside the supported
/// fragment are never merged, not even with themselves.
pub fn bijectively_equivalent(left: &Clause, right: &Clause) -> bool {
    // Only decide equivalence within the supported fragment
    if !is_supported(left) || !is_supported(right) {
        return false;
    }

    // Clauses must be the same length to be equal
    if left.body.len() != right.body.len() {
        return false;
    }

    // Head atoms must have the same arity
    if left.head.arity() != right.head.arity() {
        return false;
    }

    // Clauses must have the same number of distinct variables
    if left.variables().len() != right.variables().len() {
        return false;
    }

    // Compatibility matrix over atom slots, where slot 0 is the head and
    // slot k is body atom k-1. Rows are target positions in `right`,
    // columns are source atoms of `left`, so a permutation emitted by the
    // enumerator directly reads "which left atom lands at position p".
    // The head maps to the head unconditionally; body atoms only pair up
    // when they reference the same relation.
    let size = left.body.len() + 1;
    let mut matrix = vec![vec![false; size]; size];
    matrix[0][0] = true;
    for position in 1..size {
        for source in 1..size {
            matrix[position][source] = body_atom(left, source - 1).relation
                == body_atom(right, position - 1).relation;
        }
    }

    valid_permutations(&matrix)
        .iter()
        .any(|placement| mapping_exists(left, right, placement))
}
