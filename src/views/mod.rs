//! What each command fetches, joins and changes.
//!
//! Views return plain data; printing is left to [`crate::commands`]. Every
//! view receives the [`MarketSystem`](crate::app_system::MarketSystem)
//! explicitly, which carries the session and the backend client.

pub mod account;
pub mod admin;
pub mod catalog;
pub mod notifications;
pub mod product;

use crate::error::AppError;

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}
