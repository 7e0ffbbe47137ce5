//! Shared data model: the types every stage of the pipeline passes to the
//! next.

pub mod capture;
pub mod context;
pub mod pattern;
pub mod preprocessed;
pub mod result;
pub mod site_data;
pub mod site_index;

pub use capture::{CaptureRecord, DetectionResultRecord, MetaKind, MetaTagRecord, OneOrMany, UNKNOWN_CMS};
pub use context::{
    AnalysisContext, DiscoveryData, EmergingVendor, FamilyKind, HeaderFamily,
    HeaderSemanticAnalysis, NamingConvention, PatternType, QualityMetrics, SemanticAnomaly,
    SemanticData, SemanticInsights, StatisticalMetrics, ValidationSummary, VendorData, VendorStat,
    VendorSummary,
};
pub use pattern::{DiscriminationMetrics, PatternData, PlatformDiscrimination};
pub use preprocessed::{FilteringStats, PreprocessedData, PreprocessedMetadata};
pub use result::{AnalysisMetadata, AnalysisResult};
pub use site_data::SiteData;
pub use site_index::{SiteId, SiteIndex};
