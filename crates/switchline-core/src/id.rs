use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies an outlet in a loaded level.
    pub struct OutletId;

    /// Identifies a station in a loaded level.
    pub struct StationId;
}

/// Identifies an agent within a single run. Assigned in spawn order, so
/// comparing two ids compares their spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);
