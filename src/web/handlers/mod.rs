pub mod analytics_handlers;
pub mod chat_handlers;
pub mod market_handlers;

pub use analytics_handlers::*;
pub use chat_handlers::*;
pub use market_handlers::*;
