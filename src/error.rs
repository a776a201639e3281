//! Hard failures that abort generation.
//!
//! Everything recoverable goes through [`crate::diagnostics::Diagnostics`]
//! instead; these are structural assumption violations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    /// An enum declaration carried a kind tag other than `enum`.
    #[error("expected enum type: {kind} {name}")]
    UnexpectedKind { kind: String, name: String },

    /// A function registered as returning a caller-owned string does not.
    #[error("Function {name} expected to return char* not {found}")]
    ExpectedReturnMismatch { name: String, found: String },

    /// An output artifact was opened while another one was still open.
    #[error("file left open: {path}")]
    FileLeftOpen { path: String },

    /// A boilerplate template could not be read.
    #[error("failed to read template {path}")]
    Template {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
