//! Subject comparison service.

use std::sync::Arc;
use tracing::instrument;

use crate::errors::ReeveResult;
use crate::executor::RequestExecutor;
use crate::transport::MultipartPart;
use crate::types::{ApiResponse, FaceImage, SubjectVerificationResult};

/// Compares two faces without involving enrolled persons.
#[derive(Debug, Clone)]
pub struct SubjectService {
    executor: Arc<RequestExecutor>,
}

impl SubjectService {
    /// Creates a new subject service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Compares two faces.
    ///
    /// Two base64 inputs are sent as the `face1` and `face2` fields; any
    /// other combination is sent as two `faces` file parts.
    #[instrument(skip_all)]
    pub async fn compare(
        &self,
        face_a: FaceImage,
        face_b: FaceImage,
    ) -> ReeveResult<ApiResponse<SubjectVerificationResult>> {
        let parts = Self::parts(face_a, face_b)?;
        self.executor
            .post_multipart("subject.compare", "Subject/compare", parts)
            .await
    }

    fn parts(face_a: FaceImage, face_b: FaceImage) -> ReeveResult<Vec<MultipartPart>> {
        if face_a.is_base64() && face_b.is_base64() {
            return Ok(vec![
                face_a.into_text_part("face1")?,
                face_b.into_text_part("face2")?,
            ]);
        }

        Ok(vec![
            face_a.into_file_part("faces", Some("face1.jpg"))?,
            face_b.into_file_part("faces", Some("face2.jpg"))?,
        ])
    }
}
