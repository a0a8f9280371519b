pub mod admin_users;
pub mod tickets;

pub use admin_users as admin_user_entity;
pub use tickets as ticket_entity;
pub use tickets::{TicketStatus, TicketType};
