// ── Engine configuration ──
//
// Built by the caller and handed to `Inventory::new` — the core never reads
// config files. Policy knobs only; nothing here changes invariant behavior.

/// Tuning and policy for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// Upper bound a caller may request from the port factory. The factory
    /// itself accepts any positive count; this is the imposed policy limit
    /// (96 matches the densest supported chassis).
    pub max_ports_per_device: u32,

    /// Port count generated for drafts that supply no port list.
    pub default_port_count: u32,

    /// Persist after every successful mutation. Disable for bulk imports
    /// and save explicitly afterwards.
    pub autosave: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_ports_per_device: 96,
            default_port_count: 8,
            autosave: true,
        }
    }
}
