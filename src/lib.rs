pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::{PipelineConfig, load_config};
pub use pipeline::{
    DispatchInput, DispatchPipeline, DispatchStage, ExecutionIntent, PipelineError,
    PipelineErrorKind, RoutingTable,
};
