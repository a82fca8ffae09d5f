pub mod adapters;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod ports;
pub mod routing;

pub use dispatch::{AUDIT_EVENT, DEFAULT_SIGNER, DispatchInput, DispatchPipeline, default_sprint_reflexes};
pub use error::{DispatchStage, PipelineError, PipelineErrorKind};
pub use intent::ExecutionIntent;
pub use ports::{AuditPort, BriefWriterPort, NotifierPort, SprintSpec, SubtaskSpec, TaskSpec, TrackerPort};
pub use routing::{ClientRoute, RoutingTable};
