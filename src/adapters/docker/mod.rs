mod client;
mod compose;

pub use client::DockerAdapter;
pub use compose::ComposeScaler;
