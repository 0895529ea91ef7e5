//! Process exit codes, sysexits.h values. `CliError::exit_code` picks one.

pub const OK: i32 = 0;

/// Bad flags, or a combination the command cannot act on
pub const USAGE: i32 = 64;

/// Data format error, or a change the backend rejected
pub const DATAERR: i32 = 65;

/// Cannot open input (unknown process)
pub const NOINPUT: i32 = 66;

/// Catalog backend unavailable
pub const UNAVAILABLE: i32 = 69;

/// Fixture or config file could not be read or written
pub const IOERR: i32 = 74;

/// Unreadable settings or an unusable `api_url`
pub const CONFIG: i32 = 78;
