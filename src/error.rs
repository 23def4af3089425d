//! Crate-level error type

use thiserror::Error;

use crate::{
    lexer::LexError, merge::MergeError, parser::ParseError, requirement::RequirementError,
    transform::TransformError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("requirement error: {0}")]
    Requirement(#[from] RequirementError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
}

pub type Result<T> = std::result::Result<T, Error>;
