pub mod audit;
pub mod brief;
pub mod memory;
pub mod webhook;

pub use audit::JsonlAuditLog;
pub use brief::CharterBriefWriter;
pub use memory::{InMemoryTracker, TaskRecord};
pub use webhook::WebhookNotifier;
