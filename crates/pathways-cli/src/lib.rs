//! Pathways CLI
//!
//! Command-line front end: parses arguments, loads configuration, resolves
//! the run selection and dispatches it through the chunked engine with a
//! manifest-writing runner.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod logging;
pub mod manifest;
pub mod run;

pub use cli::{command, CliArgs, UsageError, MISSING_REGIONS};
pub use manifest::ManifestRunner;
pub use run::run;

/// Exit status on success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit status on resolution, dispatch or engine failure
pub const EXIT_FAILURE: i32 = 1;

/// Exit status on usage errors
pub const EXIT_USAGE: i32 = 2;

/// Exit status for an error
#[must_use]
pub fn exit_code(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<UsageError>().is_some() || error.downcast_ref::<clap::Error>().is_some()
    {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathways_core::{DispatchError, PathwaysError};

    #[test]
    fn usage_errors_exit_two() {
        let err = anyhow::Error::from(UsageError::MissingRegions);
        assert_eq!(exit_code(&err), EXIT_USAGE);
    }

    #[test]
    fn run_errors_exit_one() {
        let err = anyhow::Error::from(PathwaysError::from(DispatchError::SelectionEmpty));
        assert_eq!(exit_code(&err), EXIT_FAILURE);
    }
}
