//! DOM interaction primitives for the posting engine
//!
//! This crate provides the building blocks the locator, injector and verifier share:
//! - [`DomPort`]: the element-level surface (probe, activate, click, read, write)
//! - [`ScriptDom`]: the page-script implementation over a live [`cdp_adapter::PageSession`]
//! - [`poll_until`]: the one bounded fixed-delay polling loop every subsystem reuses

pub mod dom;
pub mod errors;
mod poll;
mod script_dom;
mod scripts;
pub mod types;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use dom::DomPort;
pub use errors::ActionError;
pub use poll::{poll_until, settle, PollPolicy};
pub use script_dom::ScriptDom;
pub use types::*;
