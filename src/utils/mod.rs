pub mod html;
pub mod jwt;
pub mod password;
pub mod phone;

pub use html::escape_html;
pub use jwt::*;
pub use password::*;
pub use phone::*;
