use std::path::Path;

use crate::error::{ClientError, Result};
use crate::types::IndexSpec;
use crate::vector::{check_finite, render_literal};

/// One request line of the ANN server protocol.
///
/// Vectors carried by `Write` and `Search` must already be validated and
/// normalized (see [`crate::vector::prepare`]).
#[derive(Debug, Clone, Copy)]
pub enum Command<'a> {
    Create(&'a IndexSpec),
    BulkLoad { path: &'a Path },
    Write { vectors: &'a [Vec<f32>] },
    Optimize,
    Search {
        ef_search: usize,
        k: usize,
        queries: &'a [Vec<f32>],
    },
    Memory,
}

impl Command<'_> {
    /// Verb token that starts the line.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Create(_) => "CREATE",
            Command::BulkLoad { .. } => "BULKLOAD",
            Command::Write { .. } => "WRITE",
            Command::Optimize => "OPTIMIZE",
            Command::Search { .. } => "SEARCH",
            Command::Memory => "MEMORY",
        }
    }

    /// Render the command as a newline-terminated ASCII line.
    pub fn encode(&self) -> Result<String> {
        let mut line = String::from(self.verb());

        match self {
            Command::Create(spec) => {
                spec.validate()?;
                line.push_str(&format!(
                    " {} {} {} {}",
                    spec.dimension,
                    spec.metric.wire_token(),
                    spec.m,
                    spec.ef_construction
                ));
            }
            Command::BulkLoad { path } => {
                line.push(' ');
                line.push_str(wire_path(path)?);
            }
            Command::Write { vectors } => {
                if vectors.is_empty() {
                    return Err(ClientError::Validation(
                        "WRITE requires at least one vector".into(),
                    ));
                }
                push_vectors(&mut line, vectors)?;
            }
            Command::Search {
                ef_search,
                k,
                queries,
            } => {
                if queries.is_empty() {
                    return Err(ClientError::Validation(
                        "SEARCH requires at least one query".into(),
                    ));
                }
                if *k == 0 {
                    return Err(ClientError::Validation("k must be > 0".into()));
                }
                line.push_str(&format!(" {ef_search} {k}"));
                push_vectors(&mut line, queries)?;
            }
            Command::Optimize | Command::Memory => {}
        }

        line.push('\n');
        Ok(line)
    }
}

fn push_vectors(line: &mut String, vectors: &[Vec<f32>]) -> Result<()> {
    for v in vectors {
        check_finite(v)?;
        line.push(' ');
        render_literal(v, line);
    }
    Ok(())
}

/// The server reads the path as a single token, so it must be printable
/// ASCII without spaces.
fn wire_path(path: &Path) -> Result<&str> {
    let s = path
        .to_str()
        .ok_or_else(|| ClientError::Validation(format!("non UTF-8 path: {}", path.display())))?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(ClientError::Validation(format!(
            "bulk load path must be printable ASCII without whitespace: {s:?}"
        )));
    }
    Ok(s)
}
