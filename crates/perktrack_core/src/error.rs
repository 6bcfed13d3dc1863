use std::fmt;

use crate::model::{BenefitId, CardId, MinimumSpendId};

/// Errors related to entity lookups in mutation entry points
#[derive(Debug, Clone)]
pub enum LookupError {
    CardNotFound(CardId),
    BenefitNotFound(BenefitId),
    MinimumSpendNotFound(MinimumSpendId),
    InstanceNotFound { benefit: BenefitId, index: usize },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::CardNotFound(id) => write!(f, "card {id} not found"),
            LookupError::BenefitNotFound(id) => write!(f, "benefit {id} not found"),
            LookupError::MinimumSpendNotFound(id) => {
                write!(f, "minimum spend {id} not found")
            }
            LookupError::InstanceNotFound { benefit, index } => {
                write!(f, "benefit {benefit} has no earned instance at index {index}")
            }
        }
    }
}

impl std::error::Error for LookupError {}

pub type Result<T> = std::result::Result<T, LookupError>;
