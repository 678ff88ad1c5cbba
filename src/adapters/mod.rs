pub mod docker;
pub mod notify;

pub use docker::{ComposeScaler, DockerAdapter};
pub use notify::{FanoutNotifier, LogNotifier, TelegramNotifier, WebhookNotifier};
