//! Domain types for AeroHub
//!
//! Backlog items, inventory and completed-work analytics implement the
//! Record trait for HubStore persistence. Work packages are never stored;
//! they are parsed from planner output and validated in memory.

mod analytics;
mod backlog;
mod resources;
mod work_package;

pub use analytics::{CompletedWorkPackage, EfficiencyMetrics};
pub use backlog::{BacklogFilter, BacklogItem, BacklogStatus, BacklogType, normalize_status, status_from_request};
pub use resources::{AVAILABLE, Inventory, Part, Personnel, ResourcePlanResult, ToolRecord};
pub use work_package::{PlanError, PlanIssue, Step, WorkPackage, WorkPackageReport, strip_code_fences};

// Re-export hubstore types for convenience
pub use hubstore::{Filter, FilterOp, IndexValue, Record, Store};
