//! Subject comparison types.

use serde::{Deserialize, Serialize};

/// Result of comparing two faces with no enrolled person involved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectVerificationResult {
    /// Set when one of the images could not be used for comparison.
    #[serde(default)]
    pub subject_not_suitable: bool,

    /// Whether both faces belong to the same subject.
    #[serde(default)]
    pub verification_succeeded: bool,

    /// Similarity score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SubjectVerificationResult {
    /// Returns true when both faces were usable and matched.
    pub fn is_match(&self) -> bool {
        !self.subject_not_suitable && self.verification_succeeded
    }
}
