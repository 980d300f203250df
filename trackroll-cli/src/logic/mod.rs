pub mod export;
pub mod inspector;
pub mod params;
pub mod reports;

pub use export::write_exports;
pub use inspector::write_user_history;
pub use params::{FileSource, RunOverrides, resolve_config};
