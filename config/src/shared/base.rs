use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The worker pool needs at least one worker.
    #[error("`pool_size` cannot be zero")]
    PoolSizeZero,
    /// The worker pool job queue needs room for at least one job.
    #[error("`queue_capacity` cannot be zero")]
    QueueCapacityZero,
    /// A zero call timeout would cancel every call before it starts.
    #[error("`call_timeout_ms` cannot be zero")]
    CallTimeoutZero,
    /// The rendezvous flow needs a target branch to merge into.
    #[error("`protected_branch` cannot be empty")]
    ProtectedBranchEmpty,
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
}
