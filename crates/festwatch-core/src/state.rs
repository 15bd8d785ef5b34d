//! Shared cross-platform state types.

/// Lifecycle of the client-side watchlist state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing loaded yet; membership checks see an empty list.
    #[default]
    Uninitialized,
    /// Local snapshot applied, remote copy requested.
    Loading,
    /// Remote reconciliation finished or was skipped; stays here for the session.
    Ready,
}

/// Result of one optimistic watchlist mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Applied locally and confirmed by the service.
    Applied,
    /// Nothing to do: the id was already present (add) or absent (remove).
    Unchanged,
    /// The service write failed and the local change was reverted.
    RolledBack,
}
