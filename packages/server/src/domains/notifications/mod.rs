pub mod handlers;

pub use handlers::{NotificationHandler, NOTIFIED_KINDS};
