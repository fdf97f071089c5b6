// HTTP boundary - axum server for the catalog
//
// Handlers translate path segments and query parameters into entity filters
// and a request scope, then run the entity operations on the blocking pool
// under the per-request deadline.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiMessage, AppError};
pub use router::create_router;
pub use state::AppState;
