use orioz_kernel::Module;

/// Declares the collections the portfolio application writes to at runtime.
/// Nothing is seeded.
pub struct CommunityModule;

impl CommunityModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for CommunityModule {
    fn name(&self) -> &'static str {
        "community"
    }

    fn collections(&self) -> Vec<&'static str> {
        vec!["events", "news", "transactions"]
    }
}

/// Create a new instance of the community module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(CommunityModule::new())
}
