//! Per-site browser session driver
//!
//! One [`SessionDriver`] runs the same login → compose → inject → submit → verify machine
//! for every site; a [`SiteProfile`] supplies the URLs, strategy tables and timings.

pub mod driver;
pub mod errors;
pub mod profile;
pub mod session;
pub mod sites;
pub mod types;

pub use driver::SessionDriver;
pub use errors::FlowError;
pub use profile::{
    AutomationSettings, ComposePlan, KeyBurst, LoggedInCheck, LoginField, LoginPlan, SiteProfile, SubmitPlan,
    DEFAULT_SUBREDDIT,
};
pub use session::{BrowserSession, ChromiumFactory, SessionFactory};
pub use sites::{linkedin, profile_for, reddit};
pub use types::{DriveOutcome, DriveReport, DriveStage, DriveSummary, StageRecord, StageTrace, SubmitVia};
