use idv_core::matching::DocumentAnalysis;

pub trait DocumentAnalyzer {
    fn analyze_id(&self, bucket: &str, key: &str) -> Result<DocumentAnalysis, String>;
}
