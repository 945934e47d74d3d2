//! Chat bot: command dispatch and the Telegram transport.

pub mod commands;
pub mod telegram;

pub use commands::Dispatcher;
pub use telegram::TelegramClient;
