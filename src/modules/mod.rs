pub mod community;
pub mod members;

use orioz_kernel::ModuleRegistry;

/// Register all seed modules; `members` goes first so its collection leads.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(members::create_module());
    registry.register(community::create_module());
}
