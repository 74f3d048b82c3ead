//! # Rulepad Workspace
//!
//! Host-facing glue: a panel combining the edit session with stored
//! documents, the async loop that drives it, configuration and logging.
//!
//! ```rust,no_run
//! use rulepad_workspace::{init_logging, Panel, PanelConfig, PanelEvent, PanelRuntime};
//! use rulepad_storage::DocumentLibrary;
//!
//! # async fn host() -> anyhow::Result<()> {
//! let config = PanelConfig::load(".")?;
//! init_logging(&config.log_filter)?;
//!
//! let library = DocumentLibrary::new(config.open_store(".")?);
//! let (runtime, mut channels) = PanelRuntime::new(Panel::new(&config, library));
//! let task = tokio::spawn(runtime.run());
//!
//! channels.events.send(PanelEvent::CreateDocument("news".into())).await?;
//! while let Some(message) = channels.outbound.recv().await {
//!     // forward to the evaluator
//! #   let _ = message;
//! #   break;
//! }
//!
//! channels.events.send(PanelEvent::Shutdown).await?;
//! task.await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod panel;
pub mod runtime;

mod errors;

pub use config::{PanelConfig, DEFAULT_CONFIG_NAME};
pub use errors::PanelError;
pub use logging::{init_logging, DEFAULT_LOG_FILTER};
pub use panel::{Panel, PanelEvent, PanelUpdate, COPY_NOTICE, SAVE_NOTICE};
pub use runtime::{PanelChannels, PanelRuntime};
