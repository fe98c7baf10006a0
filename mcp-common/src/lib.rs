//! MCP Adapter Common Types
//!
//! Wire types shared by the gateway and its clients: the job request
//! envelope, the job state machine and the status payloads returned when
//! polling a job.

pub mod request;
pub mod status;

pub use request::{McpContext, McpRequest, Parameters};
pub use status::{JobState, JobStatus, McpResponse, ResultResponse};
