pub mod capacity;
pub mod dto;
pub mod entity;
pub mod export;
pub mod handler;
pub mod registration_service;
pub mod registration_store;
pub mod service;
pub mod status;
pub mod sweep;
