//! Two-party pull request / merge rendezvous.
//!
//! A requesting task sends one [`types::PullRequest`] and waits for one [`types::Review`]; an
//! approving task waits for the pull request, evaluates it and always answers with either a
//! merge or a rejection, so the requester never waits on an answer that will not come. The
//! session coordinator joins both tasks before it closes the two channels, exactly once.

pub mod participants;
pub mod session;
pub mod types;
pub mod work;
