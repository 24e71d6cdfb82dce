//! Intent resolution runtime for the helpdesk.
//!
//! A question moves through a fixed chain of stages and stops at the first one
//! that can answer it:
//! 1. **Handoff** (`extraction`) - explicit requests for a human agent
//! 2. **Custom intents** (`extraction`) - canned replies for small talk
//! 3. **FAQ** - exact or keyword lookup through [`LookupService`]
//! 4. **Entities** (`extraction`, `context`) - order, ticket and product ids
//! 5. **Pronouns** (`pronoun`) - "it" resolved against the user's last entity
//! 6. **Generative fallback** (`fallback`, `llm`) - completion under a deadline
//!
//! # Key Types
//!
//! - `SupportPipeline` - the orchestrator (see `runtime`)
//! - `Resolver` - entry point shared by the pipeline and `TranslatingPipeline`
//! - `CompletionService` - pluggable completion provider (OpenAI, Ollama, canned)
//!
//! Deterministic stages always run before the model. The model only sees
//! questions nothing else could answer, and its failures never escape
//! [`Resolver::resolve`].
//!
//! [`LookupService`]: helpdesk_core::services::LookupService

pub mod context;
pub mod extraction;
pub mod fallback;
pub mod llm;
pub mod pronoun;
pub mod runtime;
pub mod translation;
pub mod wiring;

pub use context::{ContextEntry, ContextStore};
pub use fallback::{FallbackDispatcher, DEFAULT_DEADLINE, ERROR_MESSAGE, TIMEOUT_MESSAGE};
pub use llm::{CannedResponder, CompletionService, HttpCompletionClient, HttpCompletionConfig};
pub use runtime::{Resolution, ResolutionOutcome, Resolver, Stage, SupportPipeline};
pub use translation::{HttpTranslator, HttpTranslatorConfig, TranslatingPipeline};
pub use wiring::{build_dispatcher, build_resolver, WiringError};
