use thiserror::Error;

/// Failure kinds for a single ingestion run.
///
/// Every variant carries a human-readable message and propagates to the
/// process boundary as a non-zero exit; nothing is retried in-process.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid credentials, endpoints, or target identifiers.
    /// Fatal before any hardware access.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The sensor could not be reached within the read timeout.
    #[error("sensor unreachable: {0}")]
    DeviceNotFound(String),

    /// The sensor produced a malformed or sentinel payload. The reading is
    /// discarded and no write is attempted.
    #[error("invalid reading: {0}")]
    Decode(String),

    /// The write endpoint refused the request (bad token, org, or bucket).
    #[error("write rejected (HTTP {status}): {body}")]
    WriteRejected { status: u16, body: String },

    /// Transient network or server failure. Recovery is the next scheduled
    /// invocation, never an in-process retry.
    #[error("write endpoint unavailable: {0}")]
    WriteUnavailable(String),
}

impl Error {
    /// Process exit code for this failure. Configuration problems exit with
    /// 2 so schedulers can tell them apart from transient sensor or network
    /// failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 2,
            _ => 1,
        }
    }
}

/// Exit code for a binary whose error chain may wrap an [`Error`].
pub fn process_exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(1)
}

/// True when the chain carries a configuration error. Those are
/// deterministic and must abort even an interval loop instead of being
/// retried on the next cycle.
pub fn is_config_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<Error>(), Some(Error::Config(_))))
}

#[cfg(test)]
mod tests {
    use anyhow::Context as _;

    use super::*;

    #[test]
    fn config_errors_exit_with_2() {
        assert_eq!(Error::Config("missing token".into()).exit_code(), 2);
    }

    #[test]
    fn other_errors_exit_with_1() {
        assert_eq!(Error::DeviceNotFound("28-0316a279".into()).exit_code(), 1);
        assert_eq!(Error::Decode("short payload".into()).exit_code(), 1);
        assert_eq!(
            Error::WriteRejected {
                status: 401,
                body: "unauthorized".into()
            }
            .exit_code(),
            1
        );
        assert_eq!(Error::WriteUnavailable("connection refused".into()).exit_code(), 1);
    }

    #[test]
    fn exit_code_found_through_context_chain() {
        let err = anyhow::Error::new(Error::Config("empty bucket".into()))
            .context("failed to build InfluxDB client");
        assert_eq!(process_exit_code(&err), 2);

        let err = anyhow::Error::new(Error::WriteUnavailable("timeout".into()))
            .context("failed to write measurement");
        assert_eq!(process_exit_code(&err), 1);
    }

    #[test]
    fn plain_anyhow_errors_exit_with_1() {
        let err = anyhow::anyhow!("something unrelated");
        assert_eq!(process_exit_code(&err), 1);
    }

    #[test]
    fn config_errors_are_flagged_through_context_chain() {
        let err = anyhow::Error::new(Error::Config("empty room label".into()))
            .context("ingestion cycle failed");
        assert!(is_config_error(&err));

        let err = anyhow::Error::new(Error::WriteUnavailable("timeout".into()))
            .context("ingestion cycle failed");
        assert!(!is_config_error(&err));
    }

    #[test]
    fn write_rejected_display_includes_status() {
        let err = Error::WriteRejected {
            status: 401,
            body: "unauthorized access".into(),
        };
        assert_eq!(
            err.to_string(),
            "write rejected (HTTP 401): unauthorized access"
        );
    }
}
