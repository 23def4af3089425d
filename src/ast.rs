//! # Build Script - Syntax Tree and Document Model
//!
//! A build script describes how a runtime is solved: which platforms to
//! target, which requirements to resolve and at what point in time.
//!
//! ```text
//! let:
//!     # resolved against the catalog as of this instant
//!     at_time = "2023-04-27T17:30:05.999Z"
//!     runtime = solve(
//!         at_time = at_time,
//!         platforms = ["78977bc8-0f32-519d-80f3-9043f059398c"],
//!         requirements = [
//!             {
//!                 name = "perl",
//!                 namespace = "language",
//!                 version_requirements = [{ comparator = "eq", version = "5.36.0" }]
//!             }
//!         ]
//!     )
//!
//! in: runtime
//! ```
//!
//! The module is split in three layers:
//!
//! - **[tokens]** - positioned tokens produced by the lexer
//! - **[node]** - the lossless syntax [`Tree`] produced by the parser, with
//!   comments and punctuation kept as nodes
//! - **[script]** - the typed [`Script`] document built from the tree and
//!   exchanged with the build expression codec
pub mod node;
pub mod script;
pub mod tokens;

pub use node::{Node, NodeId, NodeKind, Tree};
pub use script::{InExpr, Script};
pub use tokens::{Position, Token, TokenKind};
