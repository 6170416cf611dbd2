// uranai_server/src/services/mod.rs

//! Production collaborator clients. Each one implements a trait seam from
//! the core crate (or defines one, for the commerce platform) so handlers
//! and the scheduler never care which side of a stub flag they run on.

pub mod anthropic;
pub mod gmail;
pub mod stores;

pub use anthropic::AnthropicModel;
pub use gmail::GmailMailer;
pub use stores::{CommerceClient, CommerceOrder, NullCommerceClient, OrderPage, OrderQuery, StoresCommerceClient};
