mod builder;
mod chain;
mod dedup;
mod document;
mod fees;
mod store;
mod sync;
pub mod util;

pub use builder::*;
pub use chain::*;
pub use dedup::*;
pub use document::*;
pub use fees::*;
pub use store::*;
pub use sync::*;
