//! Voice channels: the generic webhook and the Alexa skill.

pub mod alexa;
pub mod input;
pub mod webhook;

pub use input::LooseValue;
pub use webhook::WebhookResponse;
