pub mod user_notification;
