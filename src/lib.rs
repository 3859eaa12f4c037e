//! # dd-rs: Decision Diagrams in Rust
//!
//! **`dd-rs`** is a manager-centric library for three kinds of decision
//! diagrams sharing one engine:
//!
//! - **BDDs** (binary decision diagrams) with complement edges, for Boolean functions;
//! - **ADDs** (algebraic decision diagrams), for functions from assignments to `f64`;
//! - **ZDDs** (zero-suppressed decision diagrams), for families of sets.
//!
//! ## What is a decision diagram?
//!
//! A decision diagram represents a function as a directed acyclic graph in
//! which every internal node tests one variable. Nodes are hash-consed in a
//! unique table and reduced, so for a fixed variable order every function
//! has exactly one representation: equivalence checking is a pointer
//! comparison.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: all nodes live in a [`Manager`][crate::manager::Manager].
//!   Results are returned as owned handles ([`Bdd`][crate::handle::Bdd],
//!   [`Add`][crate::handle::Add], [`Zdd`][crate::handle::Zdd]) that keep their nodes alive.
//! - **Automatic memory management**: reference counting plus deferred garbage collection,
//!   with an emergency collection when a node table fills up.
//! - **Operation caching**: a lossy computed table per diagram kind.
//! - **Dynamic variable reordering**: sifting, window permutation, random,
//!   exact and genetic search, with variable groups and automatic triggering.
//! - **Resource limits**: time and node ceilings abort an operation cleanly.
//!
//! ## Basic Usage
//!
//! ```rust
//! use dd_rs::manager::Manager;
//!
//! // 1. Create a manager with three BDD variables and no ZDD variables
//! let mgr = Manager::new(3, 0, None);
//!
//! // 2. Get the projection functions (0-indexed)
//! let x0 = mgr.var(0).unwrap();
//! let x1 = mgr.var(1).unwrap();
//!
//! // 3. Build a formula: f = x0 AND (NOT x1)
//! let f = mgr.and(&x0, &!&x1).unwrap();
//!
//! // 4. Check properties
//! assert!(!f.is_zero()); // satisfiable
//! assert!(!f.is_one()); // not a tautology
//!
//! // 5. Evaluate (x0=true, x1=false, x2=false)
//! assert!(mgr.eval(&f, &[true, false, false]).unwrap());
//! ```
//!
//! ## Core Components
//!
//! - **[`manager`]**: the manager facade, configuration plumbing and statistics.
//! - **[`bdd`]**, **[`quant`]**, **[`compose`]**: Boolean operations, quantification and substitution.
//! - **[`add`]**: arithmetic on algebraic diagrams.
//! - **[`zdd`]**: set-family operations.
//! - **[`reorder`]**: dynamic variable reordering.
//! - **[`sat`]**, **[`paths`]**, **[`eval`]**: counting, enumeration and evaluation.
//! - **[`dot`]**: visualization with Graphviz.

pub mod add;
pub mod arith;
pub mod bdd;
pub mod cache;
pub mod compose;
pub mod config;
pub mod convert;
pub mod cover;
pub mod debug;
pub mod dot;
pub mod error;
pub mod eval;
pub mod gc;
pub mod handle;
pub mod manager;
pub mod node;
pub mod order;
pub mod paths;
pub mod quant;
pub mod reference;
pub mod reorder;
pub mod sat;
pub mod subtable;
pub mod table;
pub mod transfer;
pub mod types;
pub mod utils;
pub mod zdd;
