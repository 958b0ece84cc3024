//! UI layer for the desktop GUI: the greeting form and its startup config.

pub mod app;

pub use app::{DesktopGuiApp, StartupConfig};
