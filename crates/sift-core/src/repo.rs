//! Collaborator interfaces owned by the host
//!
//! The engine holds no file or database handle. Persistence, the category
//! catalogue and the transaction history all live with the host application;
//! these traits are the seams through which the engine consumes them. Host
//! failures surface as `Error::Host` so a storage problem is distinguishable
//! from a bad engine call.

use crate::error::{Error, Result};
use crate::models::{LearnedPayeeEntry, TrainingSample};

/// The host's category repository, used only to validate category ids at the
/// call boundary. The engine never stores display metadata.
pub trait CategoryLookup {
    fn contains(&self, category_id: &str) -> Result<bool>;
}

/// Reject a learn/retrain call that references a category the host does not
/// know about.
pub fn validate_category(lookup: &dyn CategoryLookup, category_id: &str) -> Result<()> {
    if lookup.contains(category_id)? {
        Ok(())
    } else {
        Err(Error::UnknownCategory(category_id.to_string()))
    }
}

/// The host's transaction repository, as a source of training samples from
/// already-categorized history (first-run bootstrap).
pub trait TrainingSource {
    fn samples(&self) -> Result<Vec<TrainingSample>>;
}

/// The host's persisted learned-payee entries, read once at process start.
pub trait LearnedPayeeSource {
    fn entries(&self) -> Result<Vec<LearnedPayeeEntry>>;
}
