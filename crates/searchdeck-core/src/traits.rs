use crate::error::QueryError;
use crate::types::{RawHit, SearchPlan};

/// Seam between the query layer and a concrete store transport.
pub trait SearchBackend: Send + Sync {
    /// True when the handle carries an embedding-provider credential.
    fn has_provider_credential(&self) -> bool;

    /// Run one planned search and return the store's raw result objects in
    /// the store's own ranking order.
    fn run_search(&self, plan: &SearchPlan) -> Result<Vec<RawHit>, QueryError>;
}
