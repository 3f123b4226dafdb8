//! `RuleGrid` Core — wire formats, envelopes, execution result model, and request shaping.

pub mod context;
pub mod envelope;
pub mod formats;
pub mod model;
pub mod paging;
pub mod results;
pub mod value;

pub use context::{authenticated_user, caller_roles, Principal, RequestContext};
pub use envelope::{headers, Envelope, PayloadKind};
pub use formats::MarshallingFormat;
pub use model::{
    EngineCommand, ExecutionRequest, ExecutionResults, FactHandle, ResponseType, ServiceResponse,
    TaskSummary, WirePayload,
};
pub use paging::PageRequest;
pub use results::{from_wire, to_wire, WireResults};
pub use value::Value;
