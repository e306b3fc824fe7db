//! The one error type shared by every part of the generator.

use failure::Fail;

/// Everything that can go wrong while building, sampling, or
/// checkpointing a Buddhabrot.  Only `CheckpointLoad` and (for the
/// periodic timer) `RenderPersist` are recovered from; the rest end
/// the run.
#[derive(Debug, Fail)]
pub enum BuddhaError {
    /// An option was out of range or the planes were the wrong shape.
    #[fail(display = "invalid configuration: {}", _0)]
    Configuration(String),

    /// The entropy source refused to produce seeds.
    #[fail(display = "random seed generation failed: {}", _0)]
    RandomGeneration(#[cause] rand::Error),

    /// The checkpoint raster or its max-count sidecar was missing or
    /// unreadable.
    #[fail(display = "could not load checkpoint: {}", _0)]
    CheckpointLoad(String),

    /// The raster or the sidecar could not be written.
    #[fail(display = "could not persist checkpoint: {}", _0)]
    RenderPersist(String),

    /// A worker thread panicked mid-cycle.
    #[fail(display = "a worker thread panicked")]
    WorkerPanicked,
}

/// Convenience result type for the whole crate.
pub type Result<T> = std::result::Result<T, BuddhaError>;
