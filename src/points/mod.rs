//! Membership points subsystem.
//!
//! # Data Flow
//! ```text
//! MembershipPlan (read-only)
//!     → calculator.rs (policy → integer award)
//!     → renewal.rs (append award to the ledger)
//!
//! Ledger (append-only deltas)
//!     → balance.rs (sum per user, uncached)
//! ```
//!
//! # Design Decisions
//! - Balance is always derived; it is never stored
//! - Fee conversion uses exact decimal arithmetic, not floats
//! - Policy type is a closed enum; unknown values fail deserialization

pub mod balance;
pub mod calculator;
pub mod ledger;
pub mod plan;
pub mod rate;
pub mod renewal;

pub use balance::PointsBalance;
pub use calculator::calculate_renewal_points;
pub use ledger::{LedgerEntry, LedgerStore};
pub use plan::{MembershipPlan, PointsPolicyType};
pub use rate::ConversionRate;
pub use renewal::award_renewal_points;
