//! Expands output definitions into columns bound to live simulation values.
//!
//! Every definition is expanded over the entities its object list selects,
//! and vector-valued quantities requested without an index over all elements
//! of their index domain. Each (entity, quantity, index) triple that the host
//! can provide becomes a [`Column`]; all others are reported as diagnostics.
//!
//! Object lists using `*` commonly select entities that do not provide a
//! quantity (not every zone has a heating model). A failed binding from such
//! a list is therefore only reported if no other entity selected by the same
//! definition provided the same quantity. A failure for an unindexed vector
//! quantity is covered by any element bound for another entity.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    core::{EntityCategory, EntityRef},
    errors::{OutputError, ResultExt},
    host::{IndexKeyKind, QuantityDescriptor, SimulationHost, ValueAccessor},
    reduction::Accumulator,
    request::{QuantityName, ReductionKind, VectorIndex},
    resolve::{PlannedRequest, StreamPlan},
    types::WithWarnings,
    units::Unit,
};

/// One (entity, quantity, index) triple to be written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub target: EntityRef,
    /// Quantity name, including the vector index if any.
    pub quantity: QuantityName,
    /// False for bindings produced by a wildcard object list.
    pub required: bool,
}

/// An output column bound to a live value.
#[derive(Debug, Clone)]
pub struct Column {
    pub binding: Binding,
    pub reduction: ReductionKind,
    /// Unit the column is written in.
    pub unit: Unit,
    pub header: String,
    accessor: ValueAccessor,
    accumulator: Option<Accumulator>,
}

impl Column {
    fn new(
        binding: Binding,
        descriptor: &QuantityDescriptor,
        accessor: ValueAccessor,
        reduction: ReductionKind,
    ) -> Result<Column, OutputError> {
        let native = Unit::parse(&descriptor.unit)
            .context(format!("Invalid unit of output quantity '{}.{}'", binding.target, binding.quantity))?;

        let unit = match reduction {
            ReductionKind::Integral => {
                native
                    .reporting_integral()
                    .map_err(|_| OutputError::IntegralUnit {
                        column: format!("{}.{}", binding.target, binding.quantity),
                        unit: native.to_string(),
                    })?
            }
            ReductionKind::Instantaneous | ReductionKind::Average => native,
        };

        let header = format!(
            "{}.{}{} [{}]",
            binding.target,
            binding.quantity,
            reduction.header_suffix(),
            unit
        );

        Ok(Column {
            binding,
            reduction,
            unit,
            header,
            accessor,
            // the average of a constant is the constant itself
            accumulator: match reduction {
                ReductionKind::Integral => Some(Accumulator::new()),
                ReductionKind::Average if !descriptor.constant => Some(Accumulator::new()),
                ReductionKind::Average | ReductionKind::Instantaneous => None,
            },
        })
    }

    /// Advances the running integral of reduced columns.
    pub fn step_completed(&mut self, t: f64) {
        if let Some(accumulator) = &mut self.accumulator {
            accumulator.step_completed(t, self.accessor.read());
        }
    }

    /// The column's value at output instant `t_out`, in the column unit.
    pub fn sample(&mut self, t_out: f64) -> f64 {
        let current = self.accessor.read();
        let value = match &mut self.accumulator {
            Some(accumulator) => accumulator.sample(t_out, current, self.reduction),
            None => current,
        };
        self.unit.from_base(value)
    }
}

/// Definition index, category, quantity name and vector index.
type BindingKey = (usize, EntityCategory, String, Option<VectorIndex>);

fn key_of(request_index: usize, binding: &Binding) -> BindingKey {
    (
        request_index,
        binding.target.category,
        binding.quantity.name.clone(),
        binding.quantity.index,
    )
}

struct Failure {
    binding: Binding,
    request_index: usize,
}

/// Quantity names to bind for one entity: the requested one, or one per
/// element of the index domain for unindexed vector quantities.
fn expand(quantity: &QuantityName, descriptor: &QuantityDescriptor) -> Vec<QuantityName> {
    match (&quantity.index, &descriptor.index) {
        (None, Some(domain)) => domain
            .keys
            .iter()
            .map(|&key| {
                let index = match domain.key_kind {
                    IndexKeyKind::Index => VectorIndex::Position(key),
                    IndexKeyKind::Id => VectorIndex::Id(key),
                };
                QuantityName::with_index(quantity.name.clone(), index)
            })
            .collect(),
        _ => vec![quantity.clone()],
    }
}

struct Binder<'a> {
    host: &'a dyn SimulationHost,
    successes: HashMap<BindingKey, Vec<EntityRef>>,
    failures: Vec<Failure>,
}

impl Binder<'_> {
    fn bind_request(&mut self, planned: &PlannedRequest) -> Result<Vec<Column>, OutputError> {
        let request = &planned.request;
        let resolved = planned.filter.resolve(self.host);
        let mut columns = Vec::new();

        for target in resolved.entities {
            let binding = Binding {
                target,
                quantity: request.quantity.clone(),
                required: !resolved.wildcard,
            };

            let Some(descriptor) = self.host.describe(&target, &request.quantity.name) else {
                self.failures.push(Failure {
                    binding,
                    request_index: planned.index,
                });
                continue;
            };

            for quantity in expand(&request.quantity, &descriptor) {
                let binding = Binding {
                    quantity,
                    ..binding.clone()
                };
                match self.host.accessor(&target, &binding.quantity) {
                    Some(accessor) => {
                        self.successes
                            .entry(key_of(planned.index, &binding))
                            .or_default()
                            .push(target);
                        let column = Column::new(binding, &descriptor, accessor, request.reduction)?;
                        if descriptor.description.is_empty() {
                            debug!("Bound output column '{}'", column.header);
                        } else {
                            debug!("Bound output column '{}' ({})", column.header, descriptor.description);
                        }
                        columns.push(column);
                    }
                    None => self.failures.push(Failure {
                        binding,
                        request_index: planned.index,
                    }),
                }
            }
        }

        Ok(columns)
    }

    /// True if another entity bound the quantity of `failure` for the same
    /// definition.
    fn is_covered(&self, failure: &Failure) -> bool {
        let binding = &failure.binding;
        let key = key_of(failure.request_index, binding);
        let other_target = |targets: &Vec<EntityRef>| targets.iter().any(|t| *t != binding.target);

        if binding.quantity.index.is_some() {
            return self.successes.get(&key).is_some_and(other_target);
        }
        let (request_index, category, name, _) = key;
        self.successes
            .iter()
            .filter(|((i, c, n, _), _)| *i == request_index && *c == category && *n == name)
            .any(|(_, targets)| other_target(targets))
    }

    /// Diagnostics for all failed bindings that are not covered by a sibling.
    fn diagnostics(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter(|failure| failure.binding.required || !self.is_covered(failure))
            .map(|failure| {
                format!(
                    "Output quantity '{}.{}' requested by output definition #{} is not available.",
                    failure.binding.target, failure.binding.quantity, failure.request_index
                )
            })
            .collect()
    }
}

/// Binds the definitions of all streams, returning one column list per stream.
///
/// Unavailable quantities are returned (and logged) as diagnostics; unusable
/// units are fatal.
pub fn bind(
    plans: &[StreamPlan],
    host: &dyn SimulationHost,
) -> Result<WithWarnings<Vec<Vec<Column>>, String>, OutputError> {
    let mut binder = Binder {
        host,
        successes: HashMap::new(),
        failures: Vec::new(),
    };

    let mut streams = Vec::with_capacity(plans.len());
    for plan in plans {
        let mut columns = Vec::new();
        for planned in &plan.requests {
            columns.extend(binder.bind_request(planned)?);
        }
        streams.push(columns);
    }

    let diagnostics = binder.diagnostics();
    for message in &diagnostics {
        warn!("{}", message);
    }
    Ok(WithWarnings::new(streams, diagnostics))
}
