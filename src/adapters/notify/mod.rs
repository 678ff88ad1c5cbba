mod fanout;
mod log_channel;
mod telegram;
mod webhook;

pub use fanout::FanoutNotifier;
pub use log_channel::LogNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;
