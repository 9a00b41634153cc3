//! CLI Exit Code Registry
//!
//! Single source of truth for the exit codes of `form26as`.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 2    | Usage error (bad args, unsupported combination)      |
//! | 3    | I/O error (input missing, output not writable)       |
//! | 4    | Parse error (page dump or extraction layer failed)   |
//! | 5    | Config error (TOML parse or validation)              |
//! | 6    | Empty result with `--fail-on-empty`                  |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input file missing or unreadable, or output could not be written.
pub const EXIT_IO: u8 = 3;

/// The page source could not be decoded, or `pdftotext` failed.
pub const EXIT_PARSE: u8 = 4;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 5;

/// No transactions were extracted and `--fail-on-empty` was given.
pub const EXIT_EMPTY: u8 = 6;

use form26as_extract::ExtractError;

/// Map an engine error to its exit code.
pub fn extract_exit_code(err: &ExtractError) -> u8 {
    match err {
        ExtractError::ConfigParse(_) | ExtractError::ConfigValidation(_) => EXIT_CONFIG,
        ExtractError::Io(_) => EXIT_IO,
        ExtractError::PageDump(_) | ExtractError::Extraction(_) => EXIT_PARSE,
    }
}
