// dropline/src/core/step.rs

/// A named step of a pipeline.
///
/// A non-optional step must have at least one handler registered, otherwise the run
/// fails with `PipelineError::HandlerMissing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}

impl StepDef {
  pub fn new(name: impl Into<String>, optional: bool) -> Self {
    Self {
      name: name.into(),
      optional,
    }
  }
}
