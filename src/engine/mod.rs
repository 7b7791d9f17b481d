// Roster engine
// Live snapshot of the store plus the business rules guarding every write

pub mod reports;
pub mod roster;
pub mod snapshot;
pub mod sync;

pub use reports::{AgentView, DashboardStats, HistoryEntry, HistorySort};
pub use roster::Roster;
pub use snapshot::RosterSnapshot;
pub use sync::SyncHandle;
