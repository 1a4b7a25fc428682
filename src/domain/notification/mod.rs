pub mod dispatcher;
pub mod entity;

pub use dispatcher::{dispatch_activity_published, DbNotificationDispatcher, NotificationDispatcher};
