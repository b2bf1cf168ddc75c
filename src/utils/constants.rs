//! Shared configuration constants
//!
//! Default values shared by the store, drafter and browser layers.

/// Chrome user agent string presented by automated sessions
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "review-responder.yaml";

/// Log file the binary writes to (the terminal belongs to the UI)
pub const DEFAULT_LOG_FILE: &str = "review_responder.log";

/// Extension of the exported review spreadsheets
pub const DEFAULT_SPREADSHEET_EXTENSION: &str = "xlsx";

/// Completion endpoint used when no base URL is configured
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when `OPENAI_MODEL_NAME` is unset
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o";

/// Reviews shown per UI page
pub const PAGE_SIZE: usize = 3;
