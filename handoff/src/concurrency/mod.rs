//! Coordination primitives shared by the runners, the transactional coordinator and the
//! rendezvous session.
//!
//! Every blocking wait in the crate goes through [`cancel::CallContext::run`], so a cancelled or
//! timed-out caller always unblocks with [`crate::error::ErrorKind::Cancelled`] or
//! [`crate::error::ErrorKind::DeadlineExceeded`].

pub mod cancel;
pub mod deadline;
pub mod group;
pub mod outcome;
