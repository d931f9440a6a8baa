//! # simout
//!
//! Time-series output engine for physical simulations.
//!
//! Output definitions ("quantity Q of the entities in object list L, sampled
//! on output grid G, reduced by rule R") are resolved against a running
//! simulation into columns bound to live values, reduced over time
//! (instantaneous, averaged or integrated) and written to tab-separated
//! result files.
//!
//! ## Quick Start
//!
//! ```rust
//! use simout::OutputSpec;
//!
//! let spec = OutputSpec::from_xml_str(
//!     r#"<Outputs timeUnit="h">
//!          <Grids>
//!            <OutputGrid name="hourly"><Interval stepSize="1 h"/></OutputGrid>
//!          </Grids>
//!          <ObjectLists>
//!            <ObjectList name="zones" referenceType="Zone" ids="*"/>
//!          </ObjectLists>
//!          <Definitions>
//!            <OutputDefinition quantity="Temperature" gridName="hourly" objectListName="zones"/>
//!          </Definitions>
//!        </Outputs>"#,
//! )
//! .unwrap();
//! assert_eq!(spec.definitions.items.len(), 1);
//! ```
//!
//! The simulation implements [`host::EntityRegistry`] and
//! [`host::QuantityRegistry`], then drives an [`OutputHandler`] with
//! `step_completed` and `produce_output` calls.

pub mod binder;
pub mod core;
pub mod errors;
pub mod filter;
pub mod host;
pub mod output;
pub mod reduction;
pub mod request;
pub mod resolve;
pub mod schedule;
pub mod specs;
pub mod types;
pub mod units;

mod validation_utils;

#[cfg(test)]
mod test_utils;

pub use crate::core::{EntityCategory, EntityId, EntityRef};
pub use crate::errors::{OutputError, ResultExt};
pub use crate::host::{QuantityDescriptor, SimulationHost, ValueAccessor};
pub use crate::output::{FlushPolicy, OutputHandler};
pub use crate::request::{QuantityName, ReductionKind, Request};
pub use crate::schedule::Schedule;
pub use crate::specs::OutputSpec;
