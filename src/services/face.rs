//! Face upload, recognition and verification service.

use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::errors::ReeveResult;
use crate::executor::RequestExecutor;
use crate::transport::MultipartPart;
use crate::types::face::Candidates;
use crate::types::{ApiResponse, Face, FaceImage, IdentifyResult, VerificationResult};

/// Manage face images and run recognition.
#[derive(Debug, Clone)]
pub struct FaceService {
    executor: Arc<RequestExecutor>,
}

impl FaceService {
    /// Creates a new face service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Uploads a face image for a person.
    #[instrument(skip(self, image))]
    pub async fn add(&self, person_id: i64, image: FaceImage) -> ReeveResult<ApiResponse<Face>> {
        let parts = vec![
            MultipartPart::text("personId", person_id.to_string()),
            image.into_file_part("face", None)?,
        ];
        self.executor.post_multipart("face.add", "Face", parts).await
    }

    /// Lists the faces of a person.
    #[instrument(skip(self))]
    pub async fn list(&self, person_id: i64) -> ReeveResult<ApiResponse<Vec<Face>>> {
        let query = [("person_id", person_id.to_string())];
        self.executor.get("face.list", "Face", &query).await
    }

    /// Deletes a face.
    #[instrument(skip(self))]
    pub async fn delete(&self, face_id: i64) -> ReeveResult<ApiResponse<Value>> {
        self.executor
            .delete("face.delete", &format!("Face/{face_id}"))
            .await
    }

    /// Identifies a face against every enrolled person.
    ///
    /// Returns the best match. When nothing scores above the threshold the
    /// call still succeeds, with no result.
    #[instrument(skip(self, image))]
    pub async fn recognize(&self, image: FaceImage) -> ReeveResult<ApiResponse<IdentifyResult>> {
        let all = self.recognize_all(image).await?;
        Ok(all.and_then(|candidates| candidates.into_iter().next()))
    }

    /// Identifies a face, returning every candidate in service order.
    #[instrument(skip(self, image))]
    pub async fn recognize_all(
        &self,
        image: FaceImage,
    ) -> ReeveResult<ApiResponse<Vec<IdentifyResult>>> {
        let parts = vec![image.into_file_part("face", None)?];
        let response: ApiResponse<Candidates<IdentifyResult>> = self
            .executor
            .post_multipart("face.recognize", "Face/recognize", parts)
            .await?;

        Ok(response.map(|candidates| {
            candidates
                .into_vec()
                .into_iter()
                .filter(|c| *c != IdentifyResult::default())
                .collect()
        }))
    }

    /// Checks a face against one enrolled person.
    #[instrument(skip(self, image))]
    pub async fn verify(
        &self,
        person_id: i64,
        image: FaceImage,
    ) -> ReeveResult<ApiResponse<VerificationResult>> {
        let parts = vec![
            MultipartPart::text("personId", person_id.to_string()),
            image.into_file_part("face", None)?,
        ];
        self.executor
            .post_multipart("face.verify", "Face/verify", parts)
            .await
    }
}
