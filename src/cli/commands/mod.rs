mod automation;
mod projection;
mod report;
mod system;

use super::registry::CommandRegistry;

pub(crate) fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::default();
    for entry in report::definitions()
        .into_iter()
        .chain(projection::definitions())
        .chain(automation::definitions())
        .chain(system::definitions())
    {
        registry.register(entry);
    }
    registry
}
