//! Domain models for the greenpia portal.
//!
//! # Core Concepts
//!
//! - [`Household`]: A registered unit in the association, keyed by its unit
//!   code (`"101"`, `"102"`, ...). The registry drives leader-rotation
//!   candidacy.
//! - [`ExemptionRequest`]: A household's request to be excused from leader
//!   duty for a specific year. Only approved requests affect rotation.
//! - [`LeaderScheduleEntry`]: The selected primary/backup leader pair for a
//!   year, progressing draft → conditional → confirmed under admin review.
//! - [`Inquiry`]: A resident question routed to the association; answering
//!   one triggers a notification.
//! - [`FaqArticle`]: Published rules/FAQ content.
//! - [`User`]: An authenticated portal account. The `leader` role is derived
//!   from schedule membership via role synchronization, never set directly.

mod exemption;
mod faq;
mod household;
mod inquiry;
mod schedule;
mod user;

pub use exemption::*;
pub use faq::*;
pub use household::*;
pub use inquiry::*;
pub use schedule::*;
pub use user::*;
