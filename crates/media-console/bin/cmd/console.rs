pub(crate) mod app;
pub(crate) mod state;
pub(crate) mod telemetry;
pub(crate) mod views;
pub(crate) mod widgets;

pub use app::ConsoleArgs;
