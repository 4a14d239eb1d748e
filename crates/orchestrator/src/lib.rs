//! The orchestrator crate: the query pipeline's single external entry
//! point. Wires `gweta-agent`'s graph into `run_query`/`stream_query`,
//! enforces the request-level deadline, and defines the caller-facing
//! request/response/event shapes (§§5, 6, 7 of the system design).

mod error;
mod events;
mod metrics;
mod orchestrator;
mod response;

pub use error::OrchestratorError;
pub use events::{GrammarEmitter, StreamEvent};
pub use metrics::{init_metrics, record_cache_outcome, record_request, record_request_error, record_total_latency};
pub use orchestrator::{Orchestrator, DEFAULT_REQUEST_DEADLINE};
pub use response::{QueryRequest, QueryResponse};
