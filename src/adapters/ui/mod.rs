pub mod banner;
pub mod render;
pub mod tui;

/// Prints the welcome banner with the site line. Call once at startup (after tracing init).
pub fn init_ui(site: &str) {
    banner::print_welcome(site);
}
