pub mod access;
pub mod advance;
pub mod aggregate;
pub mod draft;
pub mod error;
pub mod projection;
pub mod stage;
