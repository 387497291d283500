//! Domain layer: content records and the contract they share.

mod contact;
mod content;
mod feedback;
mod resource;
mod team;

pub use contact::{ContactInfo, DashboardStats};
pub use content::{Download, Faq, FileType, GalleryItem, News, NewsStatus};
pub use feedback::{Feedback, FeedbackStatus};
pub use resource::{Column, FormFields, Resource, ResourceKind};
pub use team::TeamMember;
