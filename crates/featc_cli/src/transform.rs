//! The transformation step that turns a feature file into generated code.
//!
//! The orchestrator only talks to the [`Transformer`] trait. The shipped
//! implementation, [`CommandTransformer`], runs an external program that
//! reads a JSON [`TransformRequest`] on stdin and answers with a JSON
//! [`TransformResponse`] on stdout.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

/// Everything the transformer needs to compile one module.
#[derive(Debug, Serialize)]
pub struct TransformRequest<'a> {
    /// Module name from the `Feature:` header.
    pub module: &'a str,
    /// Full feature file text.
    pub source: &'a str,
    /// Contents of the rules file (empty when none is configured).
    pub rules: &'a str,
    /// Target identifier.
    pub target: &'a str,
    /// Model or engine identifier.
    pub model: &'a str,
    /// Direct dependencies with the names they export.
    pub dependencies: Vec<DependencyContext>,
}

/// A direct dependency passed along with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyContext {
    /// Dependency module name.
    pub name: String,
    /// Names the dependency exports.
    pub exports: Vec<String>,
}

/// A successful transformation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransformResponse {
    /// Generated code.
    pub code: String,
    /// Generated tests, if any.
    #[serde(default)]
    pub tests: Option<String>,
    /// Model that actually served the request, if it differs from the configured one.
    #[serde(default)]
    pub model: Option<String>,
}

/// Errors from running a transformer.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// No `[compiler] command` is configured.
    #[error("no transformer command configured (set [compiler] command in featc.toml)")]
    NotConfigured,

    /// The transformer process could not be started or talked to.
    #[error("failed to run transformer `{program}`: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The transformer exited unsuccessfully.
    #[error("transformer exited with {status}: {stderr}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The transformer's output was not a valid response.
    #[error("invalid transformer response: {0}")]
    InvalidResponse(String),
}

/// Compiles a single module.
pub trait Transformer {
    /// Transforms one module, returning its generated code.
    fn transform(&self, request: &TransformRequest<'_>) -> Result<TransformResponse, TransformError>;
}

/// Runs an external program per module.
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    program: String,
    args: Vec<String>,
}

impl CommandTransformer {
    /// Builds a transformer from a `[compiler] command` list.
    pub fn from_command(command: &[String]) -> Result<Self, TransformError> {
        let (program, args) = command.split_first().ok_or(TransformError::NotConfigured)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn spawn_error(&self, source: std::io::Error) -> TransformError {
        TransformError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Transformer for CommandTransformer {
    fn transform(&self, request: &TransformRequest<'_>) -> Result<TransformResponse, TransformError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| TransformError::InvalidResponse(format!("cannot encode request: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // stdin is fed from its own thread while stdout is drained.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || stdin.write_all(&payload))
        });

        let output = child.wait_with_output().map_err(|e| self.spawn_error(e))?;
        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // A child that exits without reading its input is judged by its output.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(self.spawn_error(e)),
                Err(_) => {
                    return Err(self.spawn_error(std::io::Error::other("stdin writer panicked")))
                }
            }
        }

        if !output.status.success() {
            return Err(TransformError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_response(&output.stdout)
    }
}

/// Decodes a transformer's stdout.
pub fn parse_response(stdout: &[u8]) -> Result<TransformResponse, TransformError> {
    serde_json::from_slice(stdout).map_err(|e| TransformError::InvalidResponse(e.to_string()))
}
