//! OpenID Connect UserInfo endpoint (Core 1.0 §5.3), independent of the HTTP stack.
pub mod claims;
pub mod context;
pub mod error;
pub mod exchange;
pub mod outcome;
pub mod pipeline;
pub mod provider;
pub mod request;
pub mod response;
pub mod ticket;
pub mod token;

pub use context::{ApplyContext, ExtractContext, HandleContext, ValidateContext};
pub use error::{OidcError, PipelineError};
pub use exchange::UserinfoExchange;
pub use outcome::HookOutcome;
pub use pipeline::UserinfoEndpoint;
pub use provider::{DefaultUserinfoProvider, UserinfoProvider};
pub use request::{TransportRequest, UserinfoRequest};
pub use response::{UserinfoPayload, UserinfoResponse};
pub use ticket::{Claim, Principal, Ticket};
pub use token::{AccessTokenFormat, Clock, SystemClock, TokenFormatError};
