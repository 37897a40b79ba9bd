//! TREX Hardware Abstraction Layer
//!
//! The only boundary between the mitigation stack and whatever executes
//! circuits: a [`Backend`] takes a circuit and a shot count and eventually
//! produces [`Counts`]. Local simulation and remote devices look the same
//! from here.
//!
//! # Example
//!
//! ```ignore
//! use trex_hal::Backend;
//! use trex_adapter_sim::SimulatorBackend;
//! use trex_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new();
//!     let result = backend.run(&Circuit::bell()?, 1000).await?;
//!     println!("Results: {:?}", result.counts);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{Backend, WaitPolicy};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
