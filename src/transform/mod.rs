//! # Program Transformations
//!
//! The transformation layer that the compiler driver runs over a parsed
//! program. Each transformation mutates the program in place and reports
//! whether it changed anything, so transformations compose into pipelines
//! and fixed-point loops.
//!
//! ```text
//! parse(source) -> [Pipeline of Transforms] -> lowering
//! ```

use crate::ast::Program;
use crate::config::TransformConfig;
use crate::minimise::{self, MinimiseOptions};

/// A program-to-program transformation
pub trait Transform {
    /// Stable name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Apply the transformation in place. Returns true iff the program
    /// was modified.
    fn apply(&self, program: &mut Program) -> bool;
}

/// The program minimisation pass (see [`crate::minimise`]), with each of
/// its four reductions individually toggleable
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimiseProgram {
    options: MinimiseOptions,
}

impl MinimiseProgram {
    /// The pass with every reduction enabled
    pub fn new() -> Self {
        MinimiseProgram::default()
    }

    /// The pass restricted to the reductions the options enable
    pub fn with_options(options: MinimiseOptions) -> Self {
        MinimiseProgram { options }
    }
}

impl Transform for MinimiseProgram {
    fn name(&self) -> &'static str {
        "minimise-program"
    }

    fn apply(&self, program: &mut Program) -> bool {
        minimise::minimise_with_options(program, &self.options).changed()
    }
}

/// Re-applies an inner transformation until it stops changing the
/// program or `max_iterations` is reached
#[derive(Debug, Clone)]
pub struct Fixpoint<T: Transform> {
    transform: T,
    max_iterations: usize,
}

impl<T: Transform> Fixpoint<T> {
    /// Wrap a transformation with the default iteration bound
    pub fn new(transform: T) -> Self {
        Fixpoint {
            transform,
            max_iterations: 10,
        }
    }

    /// Wrap a transformation with a custom iteration bound
    pub fn with_max_iterations(transform: T, max_iterations: usize) -> Self {
        Fixpoint {
            transform,
            max_iterations,
        }
    }
}

impl<T: Transform> Transform for Fixpoint<T> {
    fn name(&self) -> &'static str {
        self.transform.name()
    }

    fn apply(&self, program: &mut Program) -> bool {
        let mut changed = false;
        for _iteration in 0..self.max_iterations {
            if !self.transform.apply(program) {
                break;
            }
            changed = true;
        }
        changed
    }
}

/// A sequence of transformations applied in order
#[derive(Default)]
pub struct Pipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Pipeline::default()
    }

    /// Append a transformation
    pub fn add(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Build the standard pipeline described by the configuration
    pub fn from_config(config: &TransformConfig) -> Self {
        let mut pipeline = Pipeline::new();
        if config.minimise {
            pipeline = pipeline.add(Fixpoint::with_max_iterations(
                MinimiseProgram::with_options(config.minimise_options),
                config.max_fixpoint_iterations,
            ));
        }
        pipeline
    }

    /// Run every transformation once, in order. Returns true iff any of
    /// them modified the program.
    pub fn run(&self, program: &mut Program) -> bool {
        let mut changed = false;
        for transform in &self.transforms {
            if transform.apply(program) {
                tracing::debug!(transform = transform.name(), "program_changed");
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn test_minimise_transform_reports_change() {
        let mut program = parse_program("a(X) :- b(X), b(X).").unwrap();
        let transform = MinimiseProgram::new();
        assert!(transform.apply(&mut program));
        assert!(!transform.apply(&mut program));
    }

    #[test]
    fn test_fixpoint_settles() {
        let mut program = parse_program(
            "r1(X) :- e(X).\n\
             r2(X) :- e(X).\n\
             out(X) :- r1(X), r2(X).",
        )
        .unwrap();
        let fixpoint = Fixpoint::new(MinimiseProgram::new());
        assert!(fixpoint.apply(&mut program));
        assert!(!fixpoint.apply(&mut program));
    }

    #[test]
    fn test_pipeline_honours_reduction_toggles() {
        let config = TransformConfig {
            minimise_options: MinimiseOptions {
                merge_singleton_relations: false,
                ..MinimiseOptions::default()
            },
            ..TransformConfig::default()
        };
        let pipeline = Pipeline::from_config(&config);
        let mut program = parse_program(
            "r1(X) :- e(X).\n\
             r2(X) :- e(X).",
        )
        .unwrap();
        assert!(!pipeline.run(&mut program));
        assert!(program.relation(&"r2".into()).is_some());
    }

    #[test]
    fn test_pipeline_from_config() {
        let config = TransformConfig::default();
        let pipeline = Pipeline::from_config(&config);
        let mut program = parse_program("a(X) :- a(X), b(X).").unwrap();
        assert!(pipeline.run(&mut program));
        assert_eq!(program.clauses().len(), 0);
    }

    #[test]
    fn test_disabled_pipeline_is_identity() {
        let config = TransformConfig {
            minimise: false,
            ..TransformConfig::default()
        };
        let pipeline = Pipeline::from_config(&config);
        let mut program = parse_program("a(X) :- b(X), b(X).").unwrap();
        assert!(!pipeline.run(&mut program));
        assert_eq!(program.clauses().len(), 1);
    }
}
