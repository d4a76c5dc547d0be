pub mod ballot;
pub mod inbound;

pub use ballot::{Ballot, Candidate};
pub use inbound::{DidChallengeResponse, InboundMessage};
