//! Dine-in order server
//!
//! Table-side customers submit orders over HTTP; kitchen and admin screens
//! follow changes through the realtime message bus.
//!
//! ```text
//! order-server/src/
//! ├── core/          # config, state, server, startup errors
//! ├── api/           # HTTP routes and handlers
//! ├── orders/        # submission and status workflows
//! ├── db/            # SQLite pool, migrations, repositories
//! ├── message/       # broadcast bus + TCP transport
//! └── utils/         # logging, time zone, validation
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod message;
pub mod orders;
pub mod utils;

pub use core::{Config, Server, ServerState, build_app};
pub use db::DbService;
pub use message::{BusMessage, EventType, MessageBus};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, read configuration and install the logger
pub fn setup_environment() -> Config {
    // A missing .env file is fine
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    let json = std::env::var("LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(config.is_production());
    init_logger_with_file(Some(&config.log_level), Some(json), config.log_dir.as_deref());
    config
}

pub fn print_banner() {
    println!(
        r#"
    ____  _               ____
   / __ \(_)___  ___     /  _/___
  / / / / / __ \/ _ \    / // __ \
 / /_/ / / / / /  __/  _/ // / / /
/_____/_/_/ /_/\___/  /___/_/ /_/
    "#
    );
}
