use std::fmt;

/// Actor used by the default pull request.
pub const DEFAULT_ACTOR: &str = "Contributor";

/// Branch used by the default pull request.
pub const DEFAULT_FEATURE_BRANCH: &str = "Feature";

/// A named line of development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    /// Whether this is the protected branch that only the approver merges into.
    pub is_master: bool,
}

impl Branch {
    /// Creates an unprotected branch.
    pub fn feature(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_master: false,
        }
    }

    /// Creates the protected branch.
    pub fn protected(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_master: true,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A request to merge `branch`, opened by `actor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub actor: String,
    pub branch: Branch,
}

impl PullRequest {
    pub fn new(actor: impl Into<String>, branch: Branch) -> Self {
        Self {
            actor: actor.into(),
            branch,
        }
    }
}

impl Default for PullRequest {
    fn default() -> Self {
        Self::new(DEFAULT_ACTOR, Branch::feature(DEFAULT_FEATURE_BRANCH))
    }
}

/// A completed integration of `from` into `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    pub to: Branch,
    pub from: Branch,
    pub approved: bool,
}

/// Why a pull request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The pull request did not name an actor.
    MissingActor,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingActor => f.write_str("pull request has no actor"),
        }
    }
}

/// A pull request that was not merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub branch: Branch,
    pub reason: RejectionReason,
}

/// The approver's answer to a pull request. Exactly one is sent per pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Review {
    Merged(Merge),
    Rejected(Rejection),
}

impl Review {
    /// Returns the merge when the pull request was merged and approved.
    pub fn approved_merge(&self) -> Option<&Merge> {
        match self {
            Review::Merged(merge) if merge.approved => Some(merge),
            _ => None,
        }
    }
}
