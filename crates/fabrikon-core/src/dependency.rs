//! Cross-factory dependency resolution.
//!
//! Walks every factory's input links, prunes links that can never be
//! satisfied (dead source factory, part the source does not produce),
//! records incoming requests on each supplying factory, and scores each
//! requested part against the supplier's exportable surplus.
//!
//! Satisfaction depends on supply, which is only known after a full solve
//! of the supplying factory — and factories may import from each other
//! mutually. The settle pipeline therefore runs this resolver between two
//! full solve passes; see [`crate::pipeline`].

use serde::{Deserialize, Serialize};

use crate::factory::{DependencyMetrics, DependencyRequest, FactoryRequests, Plan};
use crate::id::FactoryId;
use crate::part::exportable_surplus;
use crate::round::round3;

/// Why an input link was removed during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PruneReason {
    /// The source factory no longer exists in the plan.
    MissingSource,
    /// The source factory does not produce the requested part at all.
    NotExported,
}

/// A link removed during validation, reported for the aggregated alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrunedLink {
    pub factory: FactoryId,
    pub factory_name: String,
    pub source: FactoryId,
    pub part: String,
    pub reason: PruneReason,
}

/// Validate and prune input links, then rebuild every factory's dependency
/// requests and metrics. Returns the pruned links; pruning is non-fatal
/// and the plan continues in a degraded-but-usable state.
pub fn resolve_dependencies(plan: &mut Plan) -> Vec<PrunedLink> {
    let pruned = prune_invalid_links(plan);
    rebuild_requests(plan);
    rebuild_metrics(plan);
    pruned
}

fn prune_invalid_links(plan: &mut Plan) -> Vec<PrunedLink> {
    let ids = plan.ids();
    let mut pruned = Vec::new();

    // Which parts each factory produces, gathered up front so the retain
    // pass below needs no cross-factory borrows.
    let producible: Vec<(FactoryId, Vec<String>)> = ids
        .iter()
        .map(|&id| {
            let factory = &plan.factories[id];
            let parts = factory
                .parts
                .iter()
                .filter(|(_, metrics)| metrics.exportable)
                .map(|(part, _)| part.clone())
                .collect();
            (id, parts)
        })
        .collect();
    let produces = |source: FactoryId, part: &str| {
        producible
            .iter()
            .find(|(id, _)| *id == source)
            .is_some_and(|(_, parts)| parts.iter().any(|p| p == part))
    };

    for &id in &ids {
        let name = plan.factories[id].name.clone();
        let factory = &mut plan.factories[id];
        factory.inputs.retain(|link| {
            let reason = if !ids.contains(&link.source) {
                Some(PruneReason::MissingSource)
            } else if !produces(link.source, &link.part) {
                Some(PruneReason::NotExported)
            } else {
                None
            };
            match reason {
                Some(reason) => {
                    tracing::warn!(
                        factory = %name,
                        part = %link.part,
                        ?reason,
                        "removing invalid input link"
                    );
                    pruned.push(PrunedLink {
                        factory: id,
                        factory_name: name.clone(),
                        source: link.source,
                        part: link.part.clone(),
                        reason,
                    });
                    false
                }
                None => true,
            }
        });
    }
    pruned
}

fn rebuild_requests(plan: &mut Plan) {
    let ids = plan.ids();
    for &id in &ids {
        plan.factories[id].dependencies.clear();
    }

    // (supplier, requester, part, amount) tuples gathered first, then
    // applied, so no two factories are borrowed at once.
    let mut requests: Vec<(FactoryId, FactoryId, String, f64)> = Vec::new();
    for &id in &ids {
        for link in &plan.factories[id].inputs {
            requests.push((link.source, id, link.part.clone(), link.amount));
        }
    }

    for (supplier, requester, part, amount) in requests {
        let Some(factory) = plan.factory_mut(supplier) else {
            continue;
        };
        let entry = match factory
            .dependencies
            .requests
            .iter_mut()
            .find(|r| r.from == requester)
        {
            Some(entry) => entry,
            None => {
                factory.dependencies.requests.push(FactoryRequests {
                    from: requester,
                    requests: Vec::new(),
                });
                factory.dependencies.requests.last_mut().expect("just pushed")
            }
        };
        entry.requests.push(DependencyRequest { part, amount });
    }
}

fn rebuild_metrics(plan: &mut Plan) {
    let ids = plan.ids();
    for &id in &ids {
        let factory = &plan.factories[id];

        let mut requested: Vec<(String, f64)> = Vec::new();
        for request_set in &factory.dependencies.requests {
            for request in &request_set.requests {
                match requested.iter_mut().find(|(part, _)| *part == request.part) {
                    Some((_, total)) => *total += request.amount,
                    None => requested.push((request.part.clone(), request.amount)),
                }
            }
        }

        let metrics: Vec<(String, DependencyMetrics)> = requested
            .into_iter()
            .map(|(part, total)| {
                let supplied = exportable_surplus(factory, &part);
                let requested_total = round3(total);
                (
                    part,
                    DependencyMetrics {
                        requested: requested_total,
                        supplied,
                        satisfied: supplied >= requested_total,
                        difference: round3(supplied - requested_total),
                    },
                )
            })
            .collect();

        let factory = &mut plan.factories[id];
        factory.dependencies.metrics = metrics.into_iter().collect();
    }
}
