pub mod auth_service;
pub mod lifecycle_service;
pub mod notification_service;
pub mod qr_service;
pub mod ticket_service;

pub use auth_service::*;
pub use lifecycle_service::*;
pub use notification_service::*;
pub use qr_service::*;
pub use ticket_service::*;
