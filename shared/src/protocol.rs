/// Game port that is left out of the compact address form
pub const DEFAULT_GAME_PORT: u16 = 30000;

/// Default path segment of the list endpoint, relative to the list root
pub const DEFAULT_LIST_PATH: &str = "list";

/// Default period between list refreshes, in milliseconds
pub const DEFAULT_REFRESH_MS: u64 = 60_000;

/// Default interval for resource readiness polling, in milliseconds
pub const DEFAULT_POLL_MS: u64 = 10;

/// Element id of the page region the fragment is mounted into
pub const MOUNT_ID: &str = "server_list";
