//! # Output Files
//!
//! [`OutputHandler`] is the entry point used by a simulation:
//!
//! ```text
//! setup(spec, host, dir, restart)
//! loop:
//!     step_completed(t)              after every integrator step
//!     produce_output(t_out, t_time)  at output instants
//! flush_all()                        at shutdown
//! ```
//!
//! Every stream writes one tab-separated `.tsv` file. Rows are cached in
//! memory and written when the [`FlushPolicy`] says so.

pub mod handler;
pub mod stream;

pub use handler::{FlushPolicy, OutputHandler};
pub use stream::OutputStream;
