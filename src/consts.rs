/// Fixed merchant socket endpoint. The service runs a single public
/// endpoint; it is not user-configurable.
pub const MERCHANT_SOCKET_URL: &str = "wss://skincrib.com/merchants";

/// Default bound on how long a request waits for its acknowledgment.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

pub(crate) const RECONNECT_BASE_DELAY_MS: u64 = 1_000;
pub(crate) const RECONNECT_MAX_DELAY_MS: u64 = 60_000;
