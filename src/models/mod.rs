pub mod auth;
pub mod common;
pub mod ticket;

pub use auth::*;
pub use common::*;
pub use ticket::*;
