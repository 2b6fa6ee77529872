mod user;
pub use user::{ConnectionState, User, UserKey};
