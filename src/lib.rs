pub mod config;
pub mod humanize;
pub mod observability;
pub mod registration;
pub mod submission;
pub mod webhook;
