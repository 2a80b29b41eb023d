pub mod adjustment;
pub mod analyzer;
pub mod comparison;
pub mod data;
pub mod error;
pub mod scenario;
pub mod stats;
pub mod team;

pub use adjustment::VelocityAdjustment;
pub use analyzer::VelocityAnalyzer;
pub use comparison::ScenarioComparison;
pub use data::{VelocityAnalysisConfig, VelocityAnalysisResult, VelocityDataPoint};
pub use error::{Result, VelocityError};
pub use scenario::VelocityScenario;
pub use team::{RampUpCurve, TeamChange};
