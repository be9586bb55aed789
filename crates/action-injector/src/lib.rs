//! Content Injector
//!
//! Makes post content appear as committed input in a located compose element, trying
//! progressively more invasive methods until an independent read-back accepts one.

pub mod errors;
pub mod model;
pub mod policy;

mod redact;
mod runner;

pub use errors::InjectError;
pub use model::{InjectMethod, InjectReport, MethodAttempt};
pub use policy::{Acceptance, InjectPolicy};
pub use redact::preview;
pub use runner::Injector;
