use thiserror::Error;

/// Failures callers need to tell apart. Everything else travels as plain `anyhow` context.
#[derive(Debug, Error)]
pub enum XsecError {
    #[error("{0}")]
    BadInput(String),

    #[error("No matching dataset found for sample {sample} at energy {energy} TeV")]
    NoMatchingDataset { sample: String, energy: u32 },

    #[error("Dataset {0} is invalid! (cross section = 0)")]
    InvalidDataset(String),

    #[error("No datasets matched your --like parameters.")]
    NoKeysMatched,

    #[error("No history found for any of your arguments: {}", .0.join(" "))]
    NoHistoryFound(Vec<String>),

    #[error("{failed} of {attempted} writes failed")]
    CommitFailed { failed: usize, attempted: usize },

    #[error("review interrupted, nothing was written")]
    Interrupted,
}

impl XsecError {
    /// Process exit status for errors that end an invocation. Status 2 is left to
    /// clap usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            XsecError::NoHistoryFound(_) => 4,
            XsecError::CommitFailed { .. } => 3,
            _ => 1,
        }
    }
}

/// Finds the first `XsecError` in an error chain and maps it to an exit status.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<XsecError>())
        .map(XsecError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_codes_are_distinct_for_lookup_failures() {
        assert_eq!(XsecError::NoKeysMatched.exit_code(), 1);
        assert_eq!(XsecError::NoHistoryFound(vec!["a".into()]).exit_code(), 4);
    }

    #[test]
    fn exit_code_is_found_through_context() {
        let err = Err::<(), _>(XsecError::CommitFailed {
            failed: 1,
            attempted: 2,
        })
        .context("revert")
        .unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);
    }
}
