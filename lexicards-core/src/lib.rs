pub mod due;
pub mod errors;
pub mod filters;
pub mod migration;
pub mod models;
pub mod repo;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod time;

pub use due::*;
pub use errors::*;
pub use filters::*;
pub use models::*;
pub use repo::*;
pub use scheduler::*;
pub use session::*;
pub use stats::*;
