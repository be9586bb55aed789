//! Element Locator - finds the element playing a semantic role on an unstable page
//!
//! This crate implements role-driven element location with:
//! - Ranked CSS/attribute selector families per role (primary strategy)
//! - Area-plus-bonus candidate scoring ([`score`], [`rank`])
//! - Focus or presence acceptance of the top-K candidates
//! - Ordered fallbacks: container click, phrase search, viewport point, Tab probing

pub mod errors;
pub mod resolver;
pub mod scoring;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use scoring::*;
pub use types::*;
