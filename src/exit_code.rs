//! Exit code constants for the staging binary.
//!
//! The codes are part of the platform contract: the caller distinguishes
//! staging failure modes solely by the process exit status.

pub const SUCCESS: i32 = 0;
pub const STAGING_FAILED: i32 = 1;
pub const PROCFILE_INVALID: i32 = 1;
pub const DETECT_NONE_MATCHED: i32 = 222;
pub const COMPILE_FAILED: i32 = 223;
pub const RELEASE_FAILED: i32 = 224;
pub const SUPPLY_FAILED: i32 = 225;
