pub mod activity;
pub mod activity_registration;
