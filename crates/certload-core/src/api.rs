//! Business endpoint clients
//!
//! Calls that need a logged-in session. The gateway logic behind them is out
//! of scope; only their request/response contract is used.

mod topic;

pub use topic::{TopicClient, TopicPayload};
