//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

#![expect(
    dead_code,
    reason = "each test crate uses a different subset of these constants"
)]

/// Project used by every fixture.
pub const PROJECT: &str = "demo-project";

/// Zone used by every fixture.
pub const ZONE: &str = "us-east1-b";

/// Public image project hosting Debian images.
pub const IMAGE_PROJECT: &str = "debian-cloud";

/// Image family resolved to its latest image.
pub const IMAGE_FAMILY: &str = "debian-12";

/// Machine type for new instances.
pub const INSTANCE_TYPE: &str = "e2-small";

/// Instance name used by lifecycle calls.
pub const INSTANCE_NAME: &str = "web-1";

/// Bucket used by storage tests.
pub const BUCKET: &str = "demo-assets";

/// Token accepted by the mock servers.
pub const TOKEN: &str = "ya29.test-token";
