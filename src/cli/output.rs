//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ErrorKind, LakeError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &LakeError) -> String {
    e.to_string()
}

/// Process exit code for a failed command.
pub fn exit_code(e: &LakeError) -> i32 {
    match e.kind() {
        ErrorKind::InvalidReference | ErrorKind::InvalidArgument => 2,
        // EX_TEMPFAIL: another process holds the lake; retrying may succeed.
        ErrorKind::Busy => 75,
        ErrorKind::Cancelled => 130,
        _ => 1,
    }
}
