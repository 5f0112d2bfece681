//! Query execution and result shaping: strategy dispatch, normalization of
//! raw store objects into flat records, session history/statistics, and
//! CSV/JSON export.

pub mod executor;
pub mod export;
pub mod normalize;
pub mod session;

pub use executor::{build_plan, execute};
pub use normalize::normalize;
pub use session::{QueryStats, SearchHistoryEntry, SessionContext};
