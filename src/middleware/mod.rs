pub mod auth;
pub mod body;
pub mod response;

pub use auth::{require_admin, require_login, Access};
pub use body::JsonObject;
pub use response::{ApiResponse, ApiResult};
