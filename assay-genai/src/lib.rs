//! Content generation port for the assay assessment toolkit.
//!
//! Every model-backed operation in the workspace goes through one trait,
//! [`ContentGenerator`], with two methods: structured generation and answer
//! grading. Engines depend on the trait, never on a concrete backend, so the
//! whole pipeline runs against the scriptable [`MockGenerator`] in tests.
//!
//! ```text
//! engines ──▶ ContentGenerator ──▶ external model service
//!                   │
//!                   └─▶ MockGenerator (tests, offline runs)
//! ```
//!
//! Prompts are built from [`PromptTemplate`]s with `{{variable}}`
//! placeholders; rendering is strict and fails before any call is spent.

pub mod config;
pub mod error;
pub mod mock;
pub mod port;
pub mod template;

pub use config::GenAiConfig;
pub use error::{GenAiError, Result};
pub use mock::MockGenerator;
pub use port::{
    ContentGenerator, ContentGeneratorExt, GenerationRequest, GradeRequest, GradedResponse,
    with_timeout,
};
pub use template::{PromptTemplate, VariableMap};
