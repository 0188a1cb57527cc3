//! Fabrikon Core -- the production-plan calculation engine for
//! factory-building games.
//!
//! Given a plan of factories, each producing chosen products via recipes
//! and/or generating power, this crate derives every downstream quantity:
//! ingredient demand, byproduct output, building counts, power draw, the
//! satisfaction of every part, and the supply/demand verdict for every
//! import/export link between factories. Everything is a steady-state
//! per-minute rate; there is no time-stepped simulation.
//!
//! # Settle Pipeline
//!
//! [`pipeline::settle`] runs the full plan through six phases:
//!
//! 1. **Solve all** -- expand every product's recipe into ingredient and
//!    byproduct flow ([`solver`]).
//! 2. **Resolve dependencies** -- validate and prune input links, record
//!    requests on suppliers ([`dependency`]).
//! 3. **Solve all again** -- export demand is now known; ledgers and
//!    aggregates are rebuilt from scratch ([`part`], [`aggregate`]).
//! 4. **Refresh dependencies** -- metrics against final supply.
//! 5. **Reconcile building groups** -- the allocator in [`groups`].
//! 6. **Final flags** -- per-factory problem flag and sync check
//!    ([`sync`]).
//!
//! # Key Types
//!
//! - [`factory::Plan`] -- the top-level collection of factories.
//! - [`factory::Factory`] -- one factory: products, power producers,
//!   input links, and every derived quantity.
//! - [`catalogue::GameCatalogue`] -- immutable game data, injected into
//!   every calculation; built once via [`catalogue::CatalogueBuilder`] or
//!   loaded from data files by the `fabrikon-data` crate.
//! - [`part::PartMetrics`] -- the per-part demand/supply ledger record.
//! - [`factory::BuildingGroup`] -- a clocked batch of buildings; the
//!   allocator in [`groups`] keeps groups consistent with the aggregate.
//! - [`notify::Notifications`] -- non-blocking warning buffer returned
//!   from every settle.
//!
//! Execution is single-threaded and synchronous; every recompute runs to
//! completion and rebuilds derived state rather than patching it.

pub mod aggregate;
pub mod catalogue;
pub mod dependency;
pub mod factory;
pub mod groups;
pub mod id;
pub mod migration;
pub mod notify;
pub mod part;
pub mod pipeline;
pub mod power;
pub mod round;
pub mod solver;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
