use thiserror::Error;

/// Result alias for errors emitted by memo-lint internals.
pub type LintResult<T> = Result<T, MemoLintError>;

/// Structured error type for memo-lint subsystems.
#[derive(Debug, Error)]
pub enum MemoLintError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("malformed lockfile: {0}")]
    Lockfile(String),
}

impl MemoLintError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn lockfile(msg: impl Into<String>) -> Self {
        Self::Lockfile(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockfile_errors_render_with_prefix() {
        let err = MemoLintError::lockfile("no GEM section");
        assert_eq!(err.to_string(), "malformed lockfile: no GEM section");
    }
}
