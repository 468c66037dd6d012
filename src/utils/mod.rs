pub mod constants;
pub mod filename;
pub mod palette;
pub mod progress;

pub use constants::*;
pub use filename::{generate_default_export_filename, ExportFormat};
pub use palette::{BuildingPalette, BUILDING_COLORS};
pub use progress::ProgressReporter;
