mod server;
pub use server::Server;

mod level;
pub use level::LevelEntity;

mod server_config;
pub use server_config::{GlobalActionPolicy, ServerConfig};
