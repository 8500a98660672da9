//! # Program Minimisation
//!
//! Rewrites a parsed Datalog program into a semantically equivalent but
//! smaller one by removing four kinds of textual redundancy that macro
//! expansion, generated rules, and hand-written rules accumulate:
//!
//! 1. Repeated body literals within a clause
//! 2. Tautological clauses (the head reappears in the body)
//! 3. Clauses of one relation that compute the same tuples
//! 4. Singleton relations whose sole clauses compute the same tuples;
//!    references to the redundant relations are rewritten to a canonical
//!    survivor
//!
//! The workhorse is the bijective-equivalence check in [`equivalence`]:
//! a structural isomorphism test tolerant of body-atom permutation and
//! consistent variable renaming.
//!
//! One round of the four reductions can enable further ones: rewriting
//! references to a merged relation may introduce duplicate body literals
//! or make previously distinct clauses equivalent. [`minimise`] therefore
//! repeats rounds until one changes nothing, which makes the pass
//! idempotent as observed from the outside.
//!
//! ## Example
//!
//! ```datalog
//! tc_a(X, Y) :- edge(X, Y).
//! tc_b(P, Q) :- edge(P, Q).
//! uses(X) :- tc_b(X, Y).
//! ```
//!
//! After minimisation `tc_b` is gone and `uses` reads from `tc_a`:
//!
//! ```datalog
//! tc_a(X, Y) :- edge(X, Y).
//! uses(X) :- tc_a(X, Y).
//! ```
//!
//! ## Pipeline Position
//!
//! ```text
//! parse(source) -> name analysis -> [Minimise] -> lowering
//! ```

use crate::analysis::IoTypes;
use crate::ast::{Clause, Literal, Program, QualifiedName};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub mod equivalence;

pub use equivalence::bijectively_equivalent;

/// Which of the four reductions to run; everything is enabled by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimiseOptions {
    /// Drop repeated body literals within a clause
    #[serde(default = "default_enabled")]
    pub dedup_body_literals: bool,

    /// Delete clauses whose head reappears in the body
    #[serde(default = "default_enabled")]
    pub remove_tautologies: bool,

    /// Merge equivalent clauses of the same relation
    #[serde(default = "default_enabled")]
    pub merge_local_clauses: bool,

    /// Merge equivalent singleton relations and rewrite references
    #[serde(default = "default_enabled")]
    pub merge_singleton_relations: bool,
}

impl Default for MinimiseOptions {
    fn default() -> Self {
        MinimiseOptions {
            dedup_body_literals: true,
            remove_tautologies: true,
            merge_local_clauses: true,
            merge_singleton_relations: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Statistics about one minimisation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimiseStats {
    /// Duplicate body literals dropped
    pub literals_deduped: usize,
    /// Tautological clauses deleted
    pub tautologies_removed: usize,
    /// Locally equivalent clauses deleted
    pub clauses_merged: usize,
    /// Redundant singleton relations merged away
    pub relations_merged: usize,
}

impl MinimiseStats {
    /// True iff the run modified the program
    pub fn changed(&self) -> bool {
        self.literals_deduped > 0
            || self.tautologies_removed > 0
            || self.clauses_merged > 0
            || self.relations_merged > 0
    }

    fn accumulate(&mut self, round: MinimiseStats) {
        self.literals_deduped += round.literals_deduped;
        self.tautologies_removed += round.tautologies_removed;
        self.clauses_merged += round.clauses_merged;
        self.relations_merged += round.relations_merged;
    }
}

/// Minimise a program in place. Returns true iff the program was
/// modified; a second consecutive run returns false.
pub fn minimise(program: &mut Program) -> bool {
    minimise_with_stats(program).changed()
}

/// Minimise a program in place with every reduction enabled, reporting
/// per-reduction statistics accumulated over all rounds.
pub fn minimise_with_stats(program: &mut Program) -> MinimiseStats {
    minimise_with_options(program, &MinimiseOptions::default())
}

/// Minimise a program in place, running only the reductions the options
/// enable.
///
/// Every changing round strictly shrinks the program (literals, clauses,
/// or relations), so the loop terminates.
pub fn minimise_with_options(program: &mut Program, options: &MinimiseOptions) -> MinimiseStats {
    let mut stats = MinimiseStats::default();
    loop {
        let round = minimise_round(program, options);
        if !round.changed() {
            break;
        }
        stats.accumulate(round);
    }

    if stats.changed() {
        tracing::debug!(
            literals = stats.literals_deduped,
            tautologies = stats.tautologies_removed,
            clauses = stats.clauses_merged,
            relations = stats.relations_merged,
            "program_minimised"
        );
    }
    stats
}

/// One round of the enabled reductions, in order
fn minimise_round(program: &mut Program, options: &MinimiseOptions) -> MinimiseStats {
    let mut round = MinimiseStats::default();
    if options.dedup_body_literals {
        round.literals_deduped = reduce_clause_bodies(program);
    }
    if options.remove_tautologies {
        round.tautologies_removed = remove_redundant_clauses(program);
    }
    if options.merge_local_clauses {
        round.clauses_merged = reduce_locally_equivalent_clauses(program);
    }
    if options.merge_singleton_relations {
        round.relations_merged = reduce_singleton_relations(program);
    }
    round
}

/// Remove repeated literals within each clause body, keeping the first
/// occurrence and preserving order. Returns the number of literals
/// dropped.
fn reduce_clause_bodies(program: &mut Program) -> usize {
    let mut replacements: Vec<(usize, Clause)> = Vec::new();

    for (index, clause) in program.clauses().iter().enumerate() {
        let mut duplicates: HashSet<usize> = HashSet::new();
        for i in 0..clause.body.len() {
            for j in 0..i {
                if clause.body[i] == clause.body[j] {
                    duplicates.insert(i);
                    break;
                }
            }
        }

        if !duplicates.is_empty() {
            let body: Vec<Literal> = clause
                .body
                .iter()
                .enumerate()
                .filter(|(i, _)| !duplicates.contains(i))
                .map(|(_, literal)| literal.clone())
                .collect();
            replacements.push((index, Clause::new(clause.head.clone(), body)));
        }
    }

    let mut removed = 0;
    for (index, replacement) in replacements {
        removed += program.clauses()[index].body.len() - replacement.body.len();
        program.replace_clause(index, replacement);
    }
    removed
}

/// Delete clauses that are only satisfied if they are already satisfied:
/// some body literal is structurally equal to the head. Returns the
/// number of clauses deleted.
fn remove_redundant_clauses(program: &mut Program) -> usize {
    let redundant: HashSet<usize> = program
        .clauses()
        .iter()
        .enumerate()
        .filter(|(_, clause)| {
            clause
                .body
                .iter()
                .any(|literal| matches!(literal, Literal::Atom(atom) if *atom == clause.head))
        })
        .map(|(index, _)| index)
        .collect();

    program.remove_clauses_at(&redundant);
    redundant.len()
}

/// Reduce locally redundant clauses: within each relation, partition the
/// defining clauses into bijective-equivalence classes and keep only the
/// first member of each class. Returns the number of clauses deleted.
fn reduce_locally_equivalent_clauses(program: &mut Program) -> usize {
    let mut to_delete: HashSet<usize> = HashSet::new();

    for relation in program.relations() {
        // Representatives of the equivalence classes seen so far, as
        // clause indices in source order
        let mut representatives: Vec<usize> = Vec::new();

        for (index, clause) in program.clauses().iter().enumerate() {
            if clause.head.relation != relation.name {
                continue;
            }

            let known = representatives
                .iter()
                .any(|&rep| bijectively_equivalent(&program.clauses()[rep], clause));
            if known {
                to_delete.insert(index);
            } else {
                representatives.push(index);
            }
        }
    }

    program.remove_clauses_at(&to_delete);
    to_delete.len()
}

/// Remove redundant singleton relations: non-IO relations with exactly
/// one defining clause whose clause is bijectively equivalent to that of
/// an earlier singleton relation. The redundant relation and its clause
/// are removed and every remaining reference is rewritten to the
/// canonical (earliest) name, arguments preserved. Returns the number of
/// relations merged away.
///
/// Candidates are visited in relation declaration order, so the outcome
/// is deterministic for a given program.
fn reduce_singleton_relations(program: &mut Program) -> usize {
    let io_types = IoTypes::analyse(program);

    // Clause index of every non-IO singleton relation, in relation order
    let mut singleton_clauses: Vec<usize> = Vec::new();
    for relation in program.relations() {
        if io_types.is_io(&relation.name) {
            continue;
        }
        let indices: Vec<usize> = program
            .clauses()
            .iter()
            .enumerate()
            .filter(|(_, clause)| clause.head.relation == relation.name)
            .map(|(index, _)| index)
            .collect();
        if let &[only] = indices.as_slice() {
            singleton_clauses.push(only);
        }
    }

    // Pairwise equivalence. All equivalents of a surviving representative
    // map directly to it, because a redundant representative is skipped;
    // the canonical map never needs a transitive closure.
    let mut redundant: HashSet<usize> = HashSet::new();
    let mut canonical: HashMap<QualifiedName, QualifiedName> = HashMap::new();

    for (position, &first) in singleton_clauses.iter().enumerate() {
        if redundant.contains(&first) {
            continue;
        }
        for &second in &singleton_clauses[position + 1..] {
            let clauses = program.clauses();
            if bijectively_equivalent(&clauses[first], &clauses[second]) {
                redundant.insert(second);
                canonical
                    .entry(clauses[second].head.relation.clone())
                    .or_insert_with(|| clauses[first].head.relation.clone());
            }
        }
    }

    // Drop the redundant definitions before rewriting references, so the
    // removed heads themselves are never rewritten
    for name in canonical.keys() {
        program.remove_relation(name);
    }
    program.remove_clauses_at(&redundant);

    if !canonical.is_empty() {
        program.map_atoms(&mut |mut atom| {
            if let Some(survivor) = canonical.get(&atom.relation) {
                atom.relation = survivor.clone();
            }
            atom
        });
    }

    canonical.len()
}
