//! # Shared Constants
//!
//! Values shared by the library and the server crate.

/// The default path for the main application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/goldsql.db";

/// The number of reference examples placed in a prompt unless configured otherwise.
pub const DEFAULT_MAX_EXAMPLES: usize = 3;

/// Decoding temperature for every generation call.
pub const GENERATION_TEMPERATURE: f32 = 0.0;

/// Upper bound on the number of tokens the backend may produce.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// The version tag of the built-in prompt template.
pub const DEFAULT_PROMPT_VERSION: &str = "v1.0";

/// The user id recorded when the caller supplies no identity.
pub const GUEST_USER_ID: &str = "guest";

/// Requests allowed per window per user, unless configured otherwise.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 10;

/// Length of the rate-limit window in seconds, unless configured otherwise.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
