use dioxus::desktop::{Config, WindowBuilder};
use duochat::app::{App, AppServices};
use duochat::storage::settings::load_settings;
use tracing_subscriber::EnvFilter;

const THEME: &str = include_str!("../assets/theme.css");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let services = match AppServices::init(settings) {
        Ok(services) => services,
        Err(e) => {
            tracing::error!("Failed to open chat history: {}", e);
            std::process::exit(1);
        }
    };

    let config = Config::new()
        .with_window(
            WindowBuilder::new()
                .with_title("DuoChat")
                .with_inner_size(dioxus::desktop::LogicalSize::new(1200.0, 820.0)),
        )
        .with_custom_head(format!("<style>{}</style>", THEME));

    dioxus::LaunchBuilder::desktop()
        .with_cfg(config)
        .with_context(services)
        .launch(App);
}
