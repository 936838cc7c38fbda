//! Terminal UI: banner, prompt theme, spinners and the interactive driver.

pub mod banner;
pub mod progress;
pub mod tui;

use crate::domain::LocationCatalog;

/// Prints the welcome banner and applies the theme for all subsequent inquire prompts.
/// Call once at startup, after config and catalog are loaded.
pub fn init_ui(currency: &str, catalog: &LocationCatalog) {
    banner::print_welcome(currency, catalog);
    tui::apply_theme();
}
