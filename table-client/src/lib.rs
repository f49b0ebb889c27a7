//! Table client - customer and staff logic for the dine-in order server
//!
//! - [`cart`] / [`session`] / [`checkout`]: customer flow over a
//!   [`storage::SessionStorage`] port
//! - [`catalog`]: menu search and category filtering
//! - [`http`]: REST client implementing the gateway traits
//! - [`message`] / [`realtime`]: TCP bus client and order change feeds
//! - [`admin`]: dashboard and kitchen views that follow the feed

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod message;
pub mod realtime;
pub mod session;
pub mod storage;

pub use cart::CartStore;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use gateway::{CatalogGateway, OrderGateway, OrderQuery};
pub use http::HttpClient;
pub use message::{BusMessage, EventType, MessageClient, MessageError};
pub use realtime::{BusFeed, MemoryFeed, OrderFeed, Subscription};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

// Re-export shared types for convenience
pub use shared::error::{ApiResponse, AppError, ErrorCode};
