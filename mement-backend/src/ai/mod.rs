//! Generation-workflow collaborator: prompt construction and the
//! model-facing client live here. The rest of the system only sees the
//! `GenerationWorkflow` trait so tests can substitute fakes.

pub mod prompt;
pub mod workflow;

pub use prompt::PromptNode;
pub use workflow::{AgentFields, GenerationWorkflow, OpenAiWorkflow, WorkflowAnswer};

/// Workflow used when an agent does not name one.
pub const DEFAULT_WORKFLOW: &str = "answer-as-mement";

/// Persona task used when an agent carries no prompt of its own.
pub const DEFAULT_TASK: &str =
    "What is appropriate answer to the following question in a twitter post format?";
