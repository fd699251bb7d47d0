//! Face, recognition and verification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{lenient_string, option_timestamp};

/// A face image stored for a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    /// Face ID.
    pub id: i64,

    /// Storage path on the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Owning person ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,

    /// Creation timestamp.
    #[serde(default, with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp.
    #[serde(default, with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Descriptive attributes estimated for a face.
///
/// Values are passed through as the service sends them, e.g. `"33"` or
/// `"False"`; the helper methods parse the common ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAttributes {
    /// Estimated age.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<String>,
    /// Gender.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub gender: Option<String>,
    /// Facial expression.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub expression: Option<String>,
    /// Blink flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub blink: Option<String>,
    /// Mouth-open flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub mouth_open: Option<String>,
    /// Glasses flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub glasses: Option<String>,
    /// Dark glasses flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub dark_glasses: Option<String>,
    /// Ethnicity.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub ethnicity: Option<String>,
    /// Beard flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub beard: Option<String>,
    /// Mustache flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub mustache: Option<String>,
    /// Smile flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub smile: Option<String>,
    /// Face mask flag.
    #[serde(
        default,
        deserialize_with = "lenient_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub face_mask: Option<String>,
}

fn flag(value: Option<&String>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl FaceAttributes {
    /// Returns the age estimate as a number.
    pub fn age_years(&self) -> Option<u32> {
        let age = self.age.as_deref()?.trim();
        age.split_once('.').map_or(age, |(whole, _)| whole).parse().ok()
    }

    /// Returns whether the subject wears glasses.
    pub fn has_glasses(&self) -> Option<bool> {
        flag(self.glasses.as_ref())
    }

    /// Returns whether the subject wears dark glasses.
    pub fn has_dark_glasses(&self) -> Option<bool> {
        flag(self.dark_glasses.as_ref())
    }

    /// Returns whether the subject wears a face mask.
    pub fn has_face_mask(&self) -> Option<bool> {
        flag(self.face_mask.as_ref())
    }
}

/// Result of identifying a face against every enrolled person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResult {
    /// Name of the matched person; absent when nothing scored above the threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Threshold the service applied. The wire field is spelled `thresold`.
    #[serde(
        default,
        rename = "thresold",
        alias = "threshold",
        skip_serializing_if = "Option::is_none"
    )]
    pub threshold: Option<f64>,

    /// Matched person ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,

    /// Match score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Whether the service reported a match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_match_found: Option<bool>,

    /// Estimated face attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<FaceAttributes>,
}

impl IdentifyResult {
    /// Returns true when a person was matched.
    pub fn is_match(&self) -> bool {
        self.is_match_found
            .unwrap_or_else(|| self.name.as_deref().is_some_and(|n| !n.is_empty()))
    }
}

/// Result of verifying a face against one enrolled person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether the verification ran.
    #[serde(default)]
    pub success: bool,

    /// Whether the face matched the person.
    #[serde(default)]
    pub verification_succeeded: bool,

    /// Service message when the verification could not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Match score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl VerificationResult {
    /// Returns true when the face matched.
    pub fn is_match(&self) -> bool {
        self.verification_succeeded
    }
}

/// Recognition payloads arrive either as a candidate list or a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Candidates<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Candidates<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Candidates::Many(items) => items,
            Candidates::One(item) => vec![item],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_identify_result_parsing() {
        let result: IdentifyResult = serde_json::from_value(json!({
            "name": "John Doe",
            "thresold": 48,
            "personId": 1639555908,
            "score": 130,
            "isMatchFound": true,
            "attributes": {
                "age": "33",
                "gender": "Male",
                "expression": "Unknown",
                "blink": "False",
                "mouthOpen": "False",
                "glasses": "False",
                "darkGlasses": "False",
                "ethnicity": "Hispanic"
            }
        }))
        .unwrap();

        assert_eq!(result.name.as_deref(), Some("John Doe"));
        assert_eq!(result.threshold, Some(48.0));
        assert_eq!(result.person_id, Some(1_639_555_908));
        assert!(result.is_match());

        let attributes = result.attributes.unwrap();
        assert_eq!(attributes.age_years(), Some(33));
        assert_eq!(attributes.has_glasses(), Some(false));
        assert_eq!(attributes.ethnicity.as_deref(), Some("Hispanic"));
        assert_eq!(attributes.has_face_mask(), None);
    }

    #[test]
    fn test_attributes_accept_numbers_and_booleans() {
        let candidates: Candidates<IdentifyResult> = serde_json::from_value(json!([{
            "name": "John",
            "isMatchFound": true,
            "attributes": {"age": 33, "glasses": false, "darkGlasses": true, "smile": 0.82}
        }]))
        .unwrap();

        let result = candidates.into_vec().remove(0);
        let attributes = result.attributes.unwrap();
        assert_eq!(attributes.age.as_deref(), Some("33"));
        assert_eq!(attributes.age_years(), Some(33));
        assert_eq!(attributes.has_glasses(), Some(false));
        assert_eq!(attributes.has_dark_glasses(), Some(true));
        assert_eq!(attributes.smile.as_deref(), Some("0.82"));
    }

    #[test]
    fn test_fractional_age() {
        let attributes = FaceAttributes {
            age: Some("33.7".to_string()),
            ..FaceAttributes::default()
        };
        assert_eq!(attributes.age_years(), Some(33));
    }

    #[test]
    fn test_threshold_alias() {
        let result: IdentifyResult = serde_json::from_value(json!({"threshold": 50})).unwrap();
        assert_eq!(result.threshold, Some(50.0));
        assert!(!result.is_match());
    }

    #[test]
    fn test_verification_result_defaults() {
        let result: VerificationResult =
            serde_json::from_value(json!({"verificationSucceeded": true, "score": 0.98})).unwrap();

        assert!(result.is_match());
        assert!(!result.success);
        assert_eq!(result.score, Some(0.98));
    }

    #[test]
    fn test_face_parsing() {
        let face: Face = serde_json::from_value(json!({
            "id": 4,
            "path": "faces/1/4.jpg",
            "personId": 1,
            "createdAt": "2025-06-01T09:15:00Z"
        }))
        .unwrap();

        assert_eq!(face.person_id, Some(1));
        assert_eq!(face.path.as_deref(), Some("faces/1/4.jpg"));
        assert!(face.created_at.is_some());
    }

    #[test]
    fn test_candidates_shapes() {
        let many: Candidates<IdentifyResult> =
            serde_json::from_value(json!([{"name": "A"}, {"name": "B"}])).unwrap();
        assert_eq!(many.into_vec().len(), 2);

        let one: Candidates<IdentifyResult> = serde_json::from_value(json!({"name": "A"})).unwrap();
        assert_eq!(one.into_vec()[0].name.as_deref(), Some("A"));
    }
}
