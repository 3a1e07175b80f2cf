pub mod module;
pub mod registry;
pub mod report;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use report::{Outcome, Report};
pub use settings::Settings;
