//! Content management: per-type controllers, the handler registry and
//! the feedback desk.

mod controller;
mod desk;
mod handler;

pub use controller::{Prompt, ResourceController, ResourceError};
pub use desk::{FeedbackDesk, THANK_YOU};
pub use handler::{HandlerRegistry, ResourceHandler};
