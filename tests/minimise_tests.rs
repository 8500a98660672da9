//! Program Minimisation Tests
//!
//! End-to-end tests driving the pass over whole programs, plus
//! randomised properties of the equivalence oracle and the pass.
//!
//! Coverage areas:
//! - Combined reductions over realistic programs
//! - External (IO) contract preservation
//! - Reference rewriting after singleton-relation merging
//! - Idempotence and monotonicity
//! - Reflexivity/symmetry of the equivalence oracle on the fragment

use minilog::ast::builders::ClauseBuilder;
use minilog::{
    bijectively_equivalent, minimise, parse_program, Atom, Clause, Literal, Program, Term,
};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn parse(src: &str) -> Program {
    parse_program(src).expect("parse failed")
}

fn clause_strings(program: &Program) -> Vec<String> {
    program.clauses().iter().map(Clause::to_string).collect()
}

// ============================================================================
// Combined reductions
// ============================================================================

#[test]
fn test_macro_expansion_cleanup() {
    // The kind of redundancy a macro expander leaves behind: duplicated
    // literals, a tautology, a cloned rule, and a duplicated helper
    let mut program = parse(
        ".input edge\n\
         .output out\n\
         helper_a(X, Y) :- edge(X, Y), edge(X, Y).\n\
         helper_b(P, Q) :- edge(P, Q).\n\
         loop(X) :- loop(X), edge(X, X).\n\
         out(X) :- helper_a(X, Y).\n\
         out(X) :- helper_b(X, Y).",
    );

    assert!(minimise(&mut program));

    // helper_a's duplicate literal is dropped, which makes helper_b
    // redundant; the tautological loop clause disappears; the two out
    // clauses then collapse into one
    assert_eq!(
        clause_strings(&program),
        [
            "helper_a(X, Y) :- edge(X, Y).",
            "out(X) :- helper_a(X, Y).",
        ]
    );
    assert!(program.relation(&"helper_b".into()).is_none());
    assert!(!minimise(&mut program));
}

#[test]
fn test_io_contract_preserved() {
    // Relations named by IO directives must survive even when redundant
    let mut program = parse(
        ".input base\n\
         .output first\n\
         .output second\n\
         first(X) :- base(X).\n\
         second(X) :- base(X).",
    );

    assert!(!minimise(&mut program));
    assert!(program.relation(&"first".into()).is_some());
    assert!(program.relation(&"second".into()).is_some());
}

#[test]
fn test_singleton_merge_rewrites_every_reference() {
    let mut program = parse(
        "r1(X, Y) :- edge(X, Y).\n\
         r2(P, Q) :- edge(P, Q).\n\
         a(X) :- r2(X, Y).\n\
         b(X) :- r2(Y, X), r1(X, Z).\n\
         c(X) :- node(X), !r2(X, X).",
    );

    assert!(minimise(&mut program));
    assert!(program.relation(&"r2".into()).is_none());

    // No atom in the remaining program mentions r2
    let mut mentions = 0;
    let mut probe = program.clone();
    probe.map_atoms(&mut |atom| {
        if atom.relation == "r2".into() {
            mentions += 1;
        }
        atom
    });
    assert_eq!(mentions, 0);

    assert_eq!(
        clause_strings(&program),
        [
            "r1(X, Y) :- edge(X, Y).",
            "a(X) :- r1(X, Y).",
            "b(X) :- r1(Y, X), r1(X, Z).",
            "c(X) :- node(X), !r1(X, X).",
        ]
    );
}

#[test]
fn test_minimised_program_reparses_to_same_clauses() {
    let mut program = parse(
        "r1(X) :- b(X, Y), c(Y).\n\
         r2(P) :- c(Q), b(P, Q).\n\
         out(X) :- r2(X).",
    );
    minimise(&mut program);

    let reparsed = parse(&program.to_string());
    assert_eq!(reparsed.clauses(), program.clauses());
}

#[test]
fn test_generated_tuple_relations_collapse() {
    // The singleton reduction also applies to facts: two
    // constant-defined singleton relations with the same tuple merge
    let mut program = parse(
        "point_a(1, 2).\n\
         point_b(1, 2).\n\
         shifted(X) :- point_b(X, Y).",
    );
    assert!(minimise(&mut program));
    assert_eq!(
        clause_strings(&program),
        ["point_a(1, 2).", "shifted(X) :- point_a(X, Y)."]
    );
}

// ============================================================================
// Randomised properties
// ============================================================================

/// Relations usable in generated clause bodies, with fixed arities
const BODY_RELATIONS: [(&str, usize); 3] = [("b", 1), ("c", 2), ("d", 2)];

fn arb_term() -> impl Strategy<Value = Term> {
    prop_oneof![
        prop::sample::select(vec!["X", "Y", "Z", "W"]).prop_map(|v| Term::Variable(v.to_string())),
        (0i64..3).prop_map(Term::Int),
        Just(Term::Nil),
    ]
}

fn arb_atom(relation: &'static str, arity: usize) -> impl Strategy<Value = Atom> {
    prop::collection::vec(arb_term(), arity)
        .prop_map(move |args| Atom::new(relation.into(), args))
}

fn arb_body_atom() -> impl Strategy<Value = Atom> {
    prop::sample::select(BODY_RELATIONS.to_vec())
        .prop_flat_map(|(relation, arity)| arb_atom(relation, arity))
}

/// A random clause inside the supported fragment
fn arb_clause() -> impl Strategy<Value = Clause> {
    let head = prop::sample::select(vec![("p", 1usize), ("q", 2)])
        .prop_flat_map(|(relation, arity)| arb_atom(relation, arity));
    let body = prop::collection::vec(arb_body_atom(), 0..4);
    (head, body).prop_map(|(head, atoms)| {
        Clause::new(head, atoms.into_iter().map(Literal::Atom).collect())
    })
}

/// Rename variables with a fresh bijective map and permute the body by
/// rotation: the result must stay equivalent
fn rename_and_rotate(clause: &Clause) -> Clause {
    let mut order: Vec<String> = Vec::new();
    clause.visit_variables(&mut |name| {
        if !order.iter().any(|seen| seen == name) {
            order.push(name.to_string());
        }
    });

    let rename = |atom: &Atom| -> Atom {
        let args = atom
            .args
            .iter()
            .map(|term| match term {
                Term::Variable(name) => {
                    let index = order.iter().position(|v| v == name).unwrap();
                    Term::Variable(format!("R{index}"))
                }
                other => other.clone(),
            })
            .collect();
        Atom::new(atom.relation.clone(), args)
    };

    let mut body: Vec<Literal> = clause
        .body
        .iter()
        .map(|literal| Literal::Atom(rename(literal.atom().unwrap())))
        .collect();
    let rotate_by = 1.min(body.len());
    body.rotate_left(rotate_by);

    Clause::new(rename(&clause.head), body)
}

/// Assemble a program from generated clauses, registering relations
fn program_from(clauses: Vec<Clause>) -> Program {
    let mut program = Program::new();
    for clause in &clauses {
        program.ensure_relation(clause.head.relation.clone(), clause.head.arity());
        for literal in &clause.body {
            if let Some(atom) = literal.atom() {
                program.ensure_relation(atom.relation.clone(), atom.arity());
            }
        }
    }
    for clause in clauses {
        program.add_clause(clause);
    }
    program
}

proptest! {
    #[test]
    fn prop_equivalence_reflexive_on_fragment(clause in arb_clause()) {
        prop_assert!(bijectively_equivalent(&clause, &clause));
    }

    #[test]
    fn prop_equivalence_symmetric(left in arb_clause(), right in arb_clause()) {
        prop_assert_eq!(
            bijectively_equivalent(&left, &right),
            bijectively_equivalent(&right, &left)
        );
    }

    #[test]
    fn prop_renamed_permuted_clause_stays_equivalent(clause in arb_clause()) {
        let transformed = rename_and_rotate(&clause);
        prop_assert!(bijectively_equivalent(&clause, &transformed));
    }

    #[test]
    fn prop_minimise_idempotent(clauses in prop::collection::vec(arb_clause(), 0..8)) {
        let mut program = program_from(clauses);
        minimise(&mut program);
        let settled = program.clone();
        prop_assert!(!minimise(&mut program));
        prop_assert_eq!(program, settled);
    }

    #[test]
    fn prop_minimise_monotonic(clauses in prop::collection::vec(arb_clause(), 0..8)) {
        let mut program = program_from(clauses);
        let clauses_before = program.clauses().len();
        let relations_before = program.relations().len();
        minimise(&mut program);
        prop_assert!(program.clauses().len() <= clauses_before);
        prop_assert!(program.relations().len() <= relations_before);
    }
}

// ============================================================================
// Builders interoperate with the pass
// ============================================================================

#[test]
fn test_builder_constructed_program_minimises() {
    let mut program = Program::new();
    program.ensure_relation("a".into(), 1);
    program.ensure_relation("b".into(), 1);

    let original = ClauseBuilder::new("a")
        .head_vars(["X"])
        .body_atom("b", |atom| atom.var("X"))
        .body_atom("b", |atom| atom.var("X"))
        .build();
    program.add_clause(original);

    assert!(minimise(&mut program));
    assert_eq!(clause_strings(&program), ["a(X) :- b(X)."]);
}
