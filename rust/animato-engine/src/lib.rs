//! Animato engine: a tree-walking evaluator for expanded worklet modules,
//! plus the imperative reference evaluator the compiler is differentially
//! tested against.

pub mod graph;
pub mod reference;
pub mod value;
