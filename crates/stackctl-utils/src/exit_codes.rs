//! Exit code constants for stackctl.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 10 | `WAIT_TIMEOUT` | Group did not settle before the wait timeout |
//! | 11 | `GROUP_FAILED` | Group settled in a failure status |
//! | 70 | `SERVICE_UNREACHABLE` | Client could not talk to the service |
//! | 71 | `SERVICE_REJECTED` | Service declined the request |
//! | 130 | `CANCELLED` | Interrupted by the user |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants for common exit codes, or [`as_i32()`](Self::as_i32)
/// to get the numeric value for `std::process::exit()`.
///
/// ```rust
/// use stackctl_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::WAIT_TIMEOUT, ExitCode::from_i32(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration or lifecycle misuse
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Wait timeout - the group was still changing when the timeout expired
    pub const WAIT_TIMEOUT: ExitCode = ExitCode(10);

    /// Group failed - the group settled in a failure status
    pub const GROUP_FAILED: ExitCode = ExitCode(11);

    /// Service unreachable - the request never reliably reached the service
    pub const SERVICE_UNREACHABLE: ExitCode = ExitCode(70);

    /// Service rejected - the service declined the request
    pub const SERVICE_REJECTED: ExitCode = ExitCode(71);

    /// Cancelled - interrupted while waiting
    pub const CANCELLED: ExitCode = ExitCode(130);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
