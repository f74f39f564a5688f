pub mod settings;

pub use settings::{AlertMode, BotSettings};
