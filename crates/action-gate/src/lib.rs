//! Action Verifier - confirms a submission through indirect page-state signals
//!
//! This crate implements post-submission verification with:
//! - ExpectSpec: destination URL pattern, compose/submit handles, residual rule
//! - Four signals evaluated per observation; all must hold at once
//! - Bounded fixed-delay polling with a single re-click of a stuck submit control
//! - Best-observation evidence for unverified outcomes

pub mod conditions;
pub mod errors;
pub mod evidence;
pub mod types;
pub mod validator;

pub use conditions::*;
pub use errors::*;
pub use evidence::*;
pub use types::*;
pub use validator::*;
