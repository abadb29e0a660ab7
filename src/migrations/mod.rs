mod m0001_initial;
mod m0002_keyword_schedules;
mod m0003_scheduler_status;
mod m0004_tracked_sites;

use cetane::prelude::MigrationRegistry;

pub fn registry() -> MigrationRegistry {
    let mut reg = MigrationRegistry::new();
    reg.register(m0001_initial::migration());
    reg.register(m0002_keyword_schedules::migration());
    reg.register(m0003_scheduler_status::migration());
    reg.register(m0004_tracked_sites::migration());
    reg
}
