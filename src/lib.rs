//! pinbook: a customer address book that resolves pasted map links into
//! coordinates and addresses.

pub mod book;
pub mod config;
pub mod location;
pub mod server;
