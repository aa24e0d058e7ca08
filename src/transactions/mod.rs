//! Transaction flows: build, compare, submit and recovery sweep.

pub mod builder;
pub mod compare;
pub mod recovery;
pub mod submitter;

pub use builder::{SpendTarget, TransactionBuilder};
pub use compare::compare_tx;
pub use recovery::RecoverySweeper;
pub use submitter::TransactionSubmitter;
