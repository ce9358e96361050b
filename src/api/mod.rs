//! HTTP API module for the QIP Incentive Engine.
//!
//! This module provides the REST API endpoints for evaluating monthly
//! incentive batches and listing the condition catalogue.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::EvaluationRequest;
pub use response::{ApiError, CatalogueResponse};
pub use state::AppState;
