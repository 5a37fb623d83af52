pub mod builder;
pub mod compare;
pub mod constraints;
pub mod error;
pub mod extract;
pub mod menu;
pub mod money;

pub use builder::{build_model, MenuModel};
pub use compare::{cheapest, Comparator, FailureReason, RunOutcome, RunResult, VendorFailure};
pub use constraints::ConstraintSpec;
pub use error::PlanError;
pub use extract::{extract, ChosenItem, VendorResult};
pub use menu::{Catalog, MenuItem, Vendor};
