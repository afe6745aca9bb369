//! facegated: HTTP daemon that checks uploaded photos against one golden face.
//!
//! Routes:
//! - `GET /` and `GET /taunting` serve the two HTML pages from the templates directory.
//! - `POST /verify` takes a multipart `image` upload and answers with a JSON verdict.
//! - `GET /status` reports strategy, readiness and whether the models loaded.

pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod init;
pub mod routes;
pub mod server;
pub mod state;

pub use config::Config;
pub use engine::{EngineError, EngineHandle};
pub use error::{verdict_response, VerifyFailure, VerifyResponse, VerifyStatus};
pub use state::AppState;
