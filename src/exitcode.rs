//! Exit codes
//!
//! `MISSING_INTERPRETER` is fixed at 1; child failures propagate the child's
//! own code. The rest follow BSD sysexits.h.

/// No Python 3 interpreter on the search path
pub const MISSING_INTERPRETER: i32 = 1;

/// Child process ended without an exit code (killed by a signal)
pub const CHILD_SIGNALED: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
