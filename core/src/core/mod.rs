// dropline/src/core/mod.rs

//! Building blocks of the step pipeline: shared context, handler type, control signals.

pub mod context;
pub mod context_data;
pub mod control;
pub mod step;

pub use context::{Handler, Phase};
pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use step::StepDef;
