use idv_core::matching::FaceComparison;

pub trait FaceComparator {
    /// Compares the face in `source_key` against faces in `target_key`, both
    /// stored in `bucket`. Quality filtering is left to the service.
    fn compare_faces(
        &self,
        bucket: &str,
        source_key: &str,
        target_key: &str,
        similarity_threshold: f32,
    ) -> Result<FaceComparison, String>;
}
