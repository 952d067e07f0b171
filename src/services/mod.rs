//! 服务模块

pub mod advisor;
pub mod compatibility;
pub mod functions;
pub mod hexagram;
pub mod memo;
pub mod memorize;
pub mod orchestrator;
pub mod perspective;
pub mod progress;
pub mod situation;

pub use advisor::{AdviceRequest, AdviceResult, HexagramAdvisor, create_hexagram_advisor};
pub use compatibility::{CompatibilityReport, CompatibilityScore, calculate_compatibility};
pub use functions::{FunctionExecutor, FunctionRegistry, function_declarations};
pub use hexagram::{HexagramPage, HexagramQuery, HexagramService, SeedSummary, create_hexagram_service};
pub use memo::{MemoService, NewMemo, create_memo_service};
pub use memorize::{MemorizeService, create_memorize_service};
pub use orchestrator::{FirstRound, FunctionCallingOrchestrator, OrchestrationOutcome};
pub use perspective::{PerspectiveBatch, PerspectiveResponse, PerspectiveResult, PerspectiveService};
pub use progress::{ProgressService, create_progress_service};
pub use situation::{SituationAnalysis, analyze_situation};
