//! Core of the M'Cheyne reading-plan service.
//!
//! The [`plan::PlanStore`] is loaded once from the reading-plan JSON
//! document and shared read-only. [`resolve`] maps a plan and calendar date
//! to a reading entry, [`format`] shapes the outcome per channel, and
//! [`voice`] adapts both to the webhook and Alexa surfaces through a
//! [`source::ReadingSource`].

pub mod client_state;
pub mod format;
pub mod passage;
pub mod plan;
pub mod resolve;
pub mod source;
pub mod voice;
