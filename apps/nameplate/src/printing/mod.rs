// Printing glue around the layout engine: persisted printer choice, the image sink
// that receives finished pages, and the HTTP handlers that tie them together.

pub mod handlers;
pub mod settings;
pub mod sink;

pub use settings::SettingsStore;
pub use sink::{ImageSink, PrintJob, SpoolDirSink};
