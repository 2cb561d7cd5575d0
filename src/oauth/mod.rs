pub mod flow;
pub mod state;
pub mod token_store;
pub mod types;

pub use flow::*;
pub use state::*;
pub use token_store::*;
pub use types::*;
