use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Number of people to feed must be positive")]
    NoPeople,
    #[error("Budget must be a finite, non-negative amount, got {0}")]
    InvalidBudget(f64),
    #[error("Item {item} at {vendor} must serve at least one person")]
    ZeroCapacity { vendor: String, item: String },
    #[error("Item {item} at {vendor} has invalid price {price}")]
    InvalidPrice { vendor: String, item: String, price: f64 },
    #[error("Item {item} appears more than once at {vendor}")]
    DuplicateItem { vendor: String, item: String },
    #[error("Vendor {0} appears more than once in the catalog")]
    DuplicateVendor(String),
    #[error("Solver returned an unusable assignment for {vendor}: {reason}")]
    MalformedAssignment { vendor: String, reason: String },
}
