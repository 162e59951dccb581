mod settings;

pub use settings::{Cli, FileWatchSettings, Settings, StoreSettings, WebSettings};
