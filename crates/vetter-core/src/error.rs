use std::fmt;

/// Machine-readable error codes surfaced in notices and `--json` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ReviewerMissing,
    PrefsWriteFailed,
    ServerUnreachable,
    ServerRejected,
    ResponseMalformed,
    SubmissionFailed,
    ItemInProgress,
    FixtureInvalid,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ReviewerMissing => "E1002",
            Self::PrefsWriteFailed => "E1003",
            Self::ServerUnreachable => "E2001",
            Self::ServerRejected => "E2002",
            Self::ResponseMalformed => "E2003",
            Self::SubmissionFailed => "E3001",
            Self::ItemInProgress => "E3002",
            Self::FixtureInvalid => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ReviewerMissing => "No reviewer identity configured",
            Self::PrefsWriteFailed => "Could not save preferences",
            Self::ServerUnreachable => "Review server unreachable",
            Self::ServerRejected => "Review server rejected the request",
            Self::ResponseMalformed => "Malformed server response",
            Self::SubmissionFailed => "Decision was not saved",
            Self::ItemInProgress => "An item is still under review",
            Self::FixtureInvalid => "Offline fixture is invalid",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to reviewers.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in vetter/config.toml and retry."),
            Self::ReviewerMissing => {
                Some("Pass --reviewer NAME or run `vt reviewer set NAME` once.")
            }
            Self::PrefsWriteFailed => Some("Check write permissions on the config directory."),
            Self::ServerUnreachable => {
                Some("Check --server / VETTER_SERVER and that the review server is running.")
            }
            Self::ServerRejected => None,
            Self::ResponseMalformed => Some("Client and server versions may not match."),
            Self::SubmissionFailed => Some("The item is unchanged; retry the same action."),
            Self::ItemInProgress => Some("Finish or escalate the current item first."),
            Self::FixtureInvalid => Some("Fixture must be JSON with `items` and `classifications`."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 10] = [
        ErrorCode::ConfigParseError,
        ErrorCode::ReviewerMissing,
        ErrorCode::PrefsWriteFailed,
        ErrorCode::ServerUnreachable,
        ErrorCode::ServerRejected,
        ErrorCode::ResponseMalformed,
        ErrorCode::SubmissionFailed,
        ErrorCode::ItemInProgress,
        ErrorCode::FixtureInvalid,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn submission_failure_tells_reviewer_to_retry() {
        let hint = ErrorCode::SubmissionFailed.hint().unwrap_or_default();
        assert!(hint.contains("retry"));
    }

    #[test]
    fn item_in_progress_is_not_reported_as_a_bug() {
        let hint = ErrorCode::ItemInProgress.hint().unwrap_or_default();
        assert!(hint.contains("current item"));
        assert!(!hint.contains("bug"));
    }
}
