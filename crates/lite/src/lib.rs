//! # Lite
//!
//! Typed HTTP routing with OpenAPI derivation.
//!
//! A handler declares its input as a struct whose fields say where each
//! value comes from (`path`, `query`, `header`, `cookie` or the body) and
//! its output as any serializable type. Registering the handler compiles the
//! input's field metadata once, checks it against the route template and
//! documents the route in an OpenAPI 3.0.3 document, which is served as YAML
//! next to a Swagger UI page.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use lite::prelude::*;
//!
//! #[derive(LiteRequest)]
//! struct GetPet {
//!     #[lite("path=id")]
//!     id: u64,
//! }
//!
//! #[derive(Serialize, Describe)]
//! struct Pet {
//!     id: u64,
//!     name: String,
//! }
//!
//! async fn get_pet(mut cx: Context<GetPet>) -> Result<Pet, HttpError> {
//!     let request = cx.requests()?;
//!     Ok(Pet { id: request.id, name: "Rex".to_string() })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("LITE").load()?;
//!     let mut app = lite::bootstrap(&config)?;
//!     app.get("/pets/:id", get_pet).summary("Fetch a pet");
//!     app.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The derive macros expand to paths under `lite_core` and `lite_extract`,
//! so crates deriving them depend on both.
//!
//! ## Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`core`] | error model, type shapes, tag grammar, field descriptors |
//! | [`router`] | `:name` templates and the route table |
//! | [`extract`] | request binding and response serialization |
//! | [`docs`] | OpenAPI model, generator and Swagger UI page |
//! | [`server`] | `App`, contexts, middleware and the serve loop |
//! | [`config`] | layered configuration |
//! | [`telemetry`] | logging setup |

#![doc(html_root_url = "https://docs.rs/lite/0.1.0")]

pub use lite_config as config;
pub use lite_core as core;
pub use lite_docs as docs;
pub use lite_extract as extract;
pub use lite_router as router;
pub use lite_server as server;
pub use lite_telemetry as telemetry;

pub use lite_macros::{Describe, LiteRequest};

use lite_config::LiteConfig;
use lite_server::App;
use lite_telemetry::{init_logging, TelemetryError};

/// Sets up logging from `config.logging` and builds an app from the rest.
///
/// Logging is skipped when disabled. Calling it a second time in one
/// process fails with [`TelemetryError::AlreadyInitialized`].
pub fn bootstrap(config: &LiteConfig) -> Result<App, TelemetryError> {
    if config.logging.enabled {
        init_logging(&config.logging.to_log_config())?;
    }
    Ok(App::from_config(config))
}

/// Common imports.
///
/// ```rust
/// use lite::prelude::*;
/// ```
pub mod prelude {
    pub use lite_config::{ConfigLoader, LiteConfig};
    pub use lite_core::{Describe, HttpError, HttpResult, MediaFamily, Violation};
    pub use lite_extract::{DefaultValidator, RequestValidator, UploadedFile};
    pub use lite_macros::{Describe, LiteRequest};
    pub use lite_server::{
        App, Context, ContextNoRequest, FnMiddleware, Middleware, Next, Request, Response, Route,
        ShutdownSignal,
    };
    pub use serde::{Deserialize, Serialize};
}
