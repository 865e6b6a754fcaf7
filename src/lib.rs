// tutorchat — client for the machine-learning tutoring site.
//
// Layers:
//   atoms/ : constants, error type, wire types (no I/O)
//   engine/: controllers and view models built on the atoms
//   config : TOML client configuration

pub mod atoms;
pub mod config;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use config::ClientConfig;
pub use engine::analytics::{ChartSurface, Dashboard, DashboardKind};
pub use engine::backend::{HttpBackend, TutorBackend};
pub use engine::panel::PanelController;
pub use engine::widget::{ChatWidget, WidgetConfig};
