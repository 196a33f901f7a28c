pub mod dispatch;
pub mod payload;
pub mod pipeline;
pub mod report;
pub mod wordlist;

pub use dispatch::{
    DispatchGate, DispatchSummary, DispatchTask, HttpMethod, HttpProber, ParamPlacement, Prober,
};
pub use payload::{ExpansionPolicy, FUZZ_MARKER, FuzzValues, Payload, synthesize};
pub use pipeline::{Pipeline, PipelineConfig, RunSummary};
pub use report::generate_run_report;
