//! Upload chunking configuration and its one-way escalation.

const MIB: u64 = 1024 * 1024;

/// Chunk size used for resumable uploads before any escalation (100 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * MIB;

/// Largest file sent in a single request before any escalation (8 MiB).
pub const DEFAULT_MAX_MULTIPART_SIZE: u64 = 8 * MIB;

/// Chunk size and single-request threshold after escalation (20 MiB).
pub const ESCALATED_CHUNK_SIZE: u64 = 20 * MIB;

/// Sizes governing how a file is split during upload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransferConfig {
    /// Bytes sent per request of a resumable session.
    pub chunk_size: u64,
    /// Files up to this size are sent in one request.
    pub max_multipart_size: u64,
}

/// Escalation state owned by a storage facade.
///
/// A facade starts in [`TransferState::Default`]. The first upload that
/// fails with a connection error moves it to [`TransferState::Escalated`],
/// where it stays for the lifetime of the facade.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TransferState {
    /// Provider default chunking.
    #[default]
    Default,
    /// Enlarged chunking for constrained links.
    Escalated,
}

impl TransferState {
    /// Returns the sizes to use for the next transfer.
    #[must_use]
    pub const fn config(self) -> TransferConfig {
        match self {
            Self::Default => TransferConfig {
                chunk_size: DEFAULT_CHUNK_SIZE,
                max_multipart_size: DEFAULT_MAX_MULTIPART_SIZE,
            },
            Self::Escalated => TransferConfig {
                chunk_size: ESCALATED_CHUNK_SIZE,
                max_multipart_size: ESCALATED_CHUNK_SIZE,
            },
        }
    }

    /// Returns `true` once the state has escalated.
    #[must_use]
    pub const fn is_escalated(self) -> bool {
        matches!(self, Self::Escalated)
    }
}
