pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod diff;
pub mod error;
pub mod expression;
pub mod lexer;
pub mod merge;
pub mod output;
pub mod parser;
pub mod requirement;
pub mod transform;
pub mod value;

pub use ast::{InExpr, Node, NodeKind, Position, Script, Token, TokenKind, Tree};
pub use diff::diff;
pub use error::{Error, Result};
pub use expression::BuildExpression;
pub use lexer::{LexError, Lexer};
pub use merge::{MergeError, MergeResolution, MergeStrategies, is_auto_merge_possible, merge};
pub use output::to_text;
pub use parser::{ParseError, Parser, parse};
pub use requirement::{Comparator, Operation, Requirement, RequirementError, VersionConstraint};
pub use transform::TransformError;
pub use value::{Assignment, FuncCall, Value};

/// Parses script text into a [`Script`].
pub fn parse_script(source: &str) -> Result<Script> {
    let tree = parse(source)?;
    Ok(Script::from_tree(&tree)?)
}
