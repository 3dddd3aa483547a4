//! HTTP handlers

pub mod batch;
pub mod health;
pub mod history;
pub mod home;
pub mod predict;
