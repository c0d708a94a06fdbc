//! Startup banner

pub const NAME: &str = "GuideLight";
pub const TAGLINE: &str = "voice and vision guidance for the visually impaired";

/// Banner printed by the CLI on startup.
pub fn render() -> String {
    format!(
        "{} v{} — {}",
        NAME,
        env!("CARGO_PKG_VERSION"),
        TAGLINE
    )
}
