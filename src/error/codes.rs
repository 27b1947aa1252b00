/// Error code registry for polbatch
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Authentication errors
/// - 3000-3999: Connection errors
/// - 5000-5999: Input (mapping file) errors
/// - 6000-6999: Reference data errors
///
/// Anything that is not a `PolBatchError` exits with status 1.
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_TOML: u16 = 1002;
    pub const CONFIG_MISSING_REQUIRED: u16 = 1004;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;

    // Authentication errors (2000-2999)
    pub const AUTH_REJECTED: u16 = 2001;
    pub const AUTH_NO_TOKEN: u16 = 2002;
    pub const AUTH_EXPIRED: u16 = 2003;

    // Connection errors (3000-3999)
    pub const CONNECTION_UNREACHABLE: u16 = 3001;
    pub const CONNECTION_TIMEOUT: u16 = 3002;
    pub const CONNECTION_CLIENT_BUILD: u16 = 3003;

    // Input errors (5000-5999)
    pub const INPUT_UNREADABLE: u16 = 5001;
    pub const INPUT_MALFORMED_ROW: u16 = 5002;
    pub const INPUT_CONFLICTING_KEY: u16 = 5003;
    pub const INPUT_EMPTY: u16 = 5004;
    pub const INPUT_UNKNOWN_COLUMN: u16 = 5005;
    pub const OUTPUT_UNWRITABLE: u16 = 5010;

    // Reference data errors (6000-6999)
    pub const REFERENCE_NO_FISCAL_YEAR: u16 = 6001;
    pub const REFERENCE_UNKNOWN_FUND: u16 = 6002;
    pub const REFERENCE_UNREADABLE: u16 = 6003;
}
