use std::time::Duration;

/// Path of the precheck endpoint, appended to the configured base URL.
pub const PRECHECK_PATH: &str = "/flashsale/precheck";

/// Default period `K` of the duplicate-injection profile.
pub const DEFAULT_DUPLICATE_PERIOD: u64 = 7;

/// Default period `M` of the forced-failure-injection profile.
pub const DEFAULT_FORCED_FAILURE_PERIOD: u64 = 50;

/// Reserved identity which the target treats as a forced server-side failure.
pub const FORCED_FAILURE_SENTINEL: &str = "force-fail";

/// Identity shared by every iteration of the fixed-single-identity profile.
pub const DEFAULT_FIXED_IDENTITY: &str = "attacker_1";

pub const DEFAULT_PRODUCT: &str = "1001";

/// Client-claimed identity header used by the spoofed-identity-headers profile.
pub const SPOOF_HEADER: &str = "X-User-ID";

/// Body marker of a `409` caused by a repeated purchase.
pub const ALREADY_PURCHASED_MARKER: &str = "USER_ALREADY_PURCHASED";

/// Body marker of a `409` caused by exhausted stock.
pub const SOLD_OUT_MARKER: &str = "SOLD_OUT";

pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Process exit code for a run whose verdict failed.
pub const EXIT_THRESHOLD_BREACH: u8 = 99;

/// Process exit code for a run rejected before start.
pub const EXIT_CONFIG_ERROR: u8 = 104;
