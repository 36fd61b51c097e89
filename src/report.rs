/*!

Per-trial result records.

A [`TrialRecord`] is one flat row: the trial's outcome, the parameters it ran with, the network's
metadata, and summary statistics read off the final state. Absent values (a ratio with an empty
denominator, an average over no nodes) are `None` and become `null` in JSON and an empty cell in
CSV.

*/

use crate::{
    contact_history::ContextContactHistoryExt,
    context::Context,
    entity::ContextEntityExt,
    network::{EdgeId, EdgeKind, Network, NodeId},
    parameters::{ContextParametersExt, EdgeRate, NodeRate, Parameters},
    population::{
        Adopter, ContextPopulationExt, EpiState, ExposedAt, Group, InfectiousAt, QuarantinedAt,
        RecoveredAt, Route, TracingProbability,
    },
    simulation::{TrialOutcome, TrialStatus},
    IxaError,
};
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, io::Write, sync::Arc};

/// Replaces [`Network::classify_edge`] when reporting local versus long-range edges.
pub type EdgeClassifier = Arc<dyn Fn(&Network, EdgeId) -> EdgeKind + Send + Sync>;

/// Cohort-level statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GroupSummary {
    pub size: usize,
    pub adopters: usize,
    /// `adopters / size`; absent for an empty cohort.
    pub adoption_rate: Option<f64>,
    /// Mean of `infectious_at - exposed_at` over nodes that went through both.
    pub avg_exposed_interval: Option<f64>,
    /// Mean time from becoming infectious to the earlier of quarantine and recovery. Negative
    /// when a node was quarantined while still exposed.
    pub avg_effective_infectious_interval: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialRecord {
    pub trial: usize,
    /// The seed this trial actually ran with.
    pub seed: u64,
    pub status: TrialStatus,
    /// Steps executed.
    pub time: usize,
    #[serde(flatten)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
    /// Susceptible count after the final step has run. This is not the last entry of
    /// `TrialOutcome::susceptible_series`, which is taken before each step and so can be larger.
    pub s_final: usize,
    pub infected_ratio: f64,
    pub route_edges: usize,
    pub route_edges_local: usize,
    pub route_edges_long_range: usize,
    /// Share of route edges that are local; absent when nothing was transmitted.
    pub route_adjacent_ratio: Option<f64>,
    /// Adopter-adopter edges with `c > 0.5`.
    pub traced_edges: usize,
    /// The long-range subset of `traced_edges`.
    pub traced_edges_distant: usize,
    /// Contact events recorded by the app over the whole trial.
    pub traced_contacts: usize,
    /// Cohorts 0 and 1 always appear; further cohorts appear when some node carries them.
    pub groups: BTreeMap<u8, GroupSummary>,
}

#[derive(Default)]
struct Intervals {
    exposed: Vec<f64>,
    effective_infectious: Vec<f64>,
}

impl TrialRecord {
    /// Reads the final state of a finished trial.
    #[allow(clippy::cast_precision_loss)]
    pub fn extract(
        context: &Context,
        trial: usize,
        outcome: &TrialOutcome,
        classifier: Option<&EdgeClassifier>,
    ) -> Result<Self, IxaError> {
        let network = context.get_network();
        let parameters = context.get_params();
        let history = context
            .get_contact_history()
            .ok_or_else(|| IxaError::IxaError("trial has no contact history".to_string()))?;
        let classify = |edge_id| match classifier {
            Some(classifier) => classifier(&*network, edge_id),
            None => network.classify_edge(edge_id),
        };

        let n = network.node_count();
        let s_final = context.count_in_state(EpiState::Susceptible);

        let mut route_edges_local = 0;
        let mut route_edges_long_range = 0;
        let mut traced_edges = 0;
        let mut traced_edges_distant = 0;
        for (edge_id, u, v) in network.edges() {
            let kind = classify(edge_id);
            if context.get_property::<Route>(edge_id) == Some(Route(true)) {
                match kind {
                    EdgeKind::Local => route_edges_local += 1,
                    EdgeKind::LongRange => route_edges_long_range += 1,
                }
            }
            let traceable = context.is_adopter(u)
                && context.is_adopter(v)
                && context
                    .get_property::<TracingProbability>(edge_id)
                    .is_some_and(|TracingProbability(c)| c > 0.5);
            if traceable {
                traced_edges += 1;
                if kind == EdgeKind::LongRange {
                    traced_edges_distant += 1;
                }
            }
        }
        let route_edges = route_edges_local + route_edges_long_range;

        Ok(TrialRecord {
            trial,
            seed: parameters.seed,
            status: outcome.status,
            time: outcome.steps,
            parameters: parameter_labels(parameters),
            metadata: network.metadata().clone(),
            s_final,
            infected_ratio: (n - s_final) as f64 / n as f64,
            route_edges,
            route_edges_local,
            route_edges_long_range,
            route_adjacent_ratio: ratio(route_edges_local, route_edges),
            traced_edges,
            traced_edges_distant,
            traced_contacts: history.total_contacts(),
            groups: group_summaries(context),
        })
    }

    /// The record as `(column, cell)` pairs, in column order. Absent values are empty cells.
    pub fn cells(&self) -> Vec<(String, String)> {
        let mut cells = vec![
            ("trial".to_string(), self.trial.to_string()),
            ("seed".to_string(), self.seed.to_string()),
            ("status".to_string(), status_label(self.status).to_string()),
            ("time".to_string(), self.time.to_string()),
        ];
        for (key, value) in self.parameters.iter().chain(&self.metadata) {
            cells.push((key.clone(), cell(value)));
        }
        cells.extend([
            ("s_final".to_string(), self.s_final.to_string()),
            ("infected_ratio".to_string(), self.infected_ratio.to_string()),
            ("route_edges".to_string(), self.route_edges.to_string()),
            ("route_edges_local".to_string(), self.route_edges_local.to_string()),
            ("route_edges_long_range".to_string(), self.route_edges_long_range.to_string()),
            ("route_adjacent_ratio".to_string(), optional_cell(self.route_adjacent_ratio)),
            ("traced_edges".to_string(), self.traced_edges.to_string()),
            ("traced_edges_distant".to_string(), self.traced_edges_distant.to_string()),
            ("traced_contacts".to_string(), self.traced_contacts.to_string()),
        ]);
        for (group, summary) in &self.groups {
            cells.extend([
                (format!("group_{group}_adoption_rate"), optional_cell(summary.adoption_rate)),
                (
                    format!("group_{group}_avg_exposed_interval"),
                    optional_cell(summary.avg_exposed_interval),
                ),
                (
                    format!("group_{group}_avg_effective_infectious_interval"),
                    optional_cell(summary.avg_effective_infectious_interval),
                ),
            ]);
        }
        cells
    }
}

/// The union of every record's columns, in first-seen order.
pub fn columns(records: &[TrialRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for (column, _) in record.cells() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    columns
}

/// Writes one CSV row per record under the union of their columns. A record without a column
/// gets an empty cell.
pub fn write_csv<W: Write>(records: &[TrialRecord], writer: W) -> Result<(), IxaError> {
    let columns = columns(records);
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&columns)?;
    for record in records {
        let cells: BTreeMap<String, String> = record.cells().into_iter().collect();
        writer.write_record(
            columns
                .iter()
                .map(|column| cells.get(column).map_or("", String::as_str)),
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[TrialRecord], writer: W) -> Result<(), IxaError> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

fn parameter_labels(parameters: &Parameters) -> BTreeMap<String, Value> {
    let node_rate = |rate: &NodeRate| match rate {
        NodeRate::Constant(p) => Value::from(*p),
        _ => Value::from(rate.label()),
    };
    let edge_rate = |rate: &EdgeRate| match rate {
        EdgeRate::Constant(p) => Value::from(*p),
        _ => Value::from(rate.label()),
    };
    BTreeMap::from([
        ("A".to_string(), node_rate(&parameters.adoption)),
        ("W".to_string(), edge_rate(&parameters.activation)),
        ("C".to_string(), edge_rate(&parameters.tracing)),
        ("beta_hat".to_string(), Value::from(parameters.beta_hat)),
        ("alpha".to_string(), Value::from(parameters.alpha)),
        ("gamma".to_string(), Value::from(parameters.gamma)),
        ("zeta".to_string(), Value::from(parameters.zeta)),
        ("limit".to_string(), Value::from(parameters.limit)),
        ("max_steps".to_string(), Value::from(parameters.max_steps)),
    ])
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
fn group_summaries(context: &Context) -> BTreeMap<u8, GroupSummary> {
    let mut groups: BTreeMap<u8, GroupSummary> =
        BTreeMap::from([(0, GroupSummary::default()), (1, GroupSummary::default())]);
    let mut intervals: BTreeMap<u8, Intervals> = BTreeMap::new();

    for node_id in context.entity_iter::<NodeId>() {
        let Some(Group(group)) = context.get_property::<Group>(node_id) else {
            continue;
        };
        let summary = groups.entry(group).or_default();
        summary.size += 1;
        if context.get_property::<Adopter>(node_id) == Some(Adopter(true)) {
            summary.adopters += 1;
        }

        let exposed_at = context.get_property::<ExposedAt>(node_id).map(|ExposedAt(t)| t);
        let infectious_at = context.get_property::<InfectiousAt>(node_id).map(|InfectiousAt(t)| t);
        let recovered_at = context.get_property::<RecoveredAt>(node_id).map(|RecoveredAt(t)| t);
        let quarantined_at = context.get_property::<QuarantinedAt>(node_id).map(|QuarantinedAt(t)| t);
        let node_intervals = intervals.entry(group).or_default();

        if let (Some(exposed_at), Some(infectious_at)) = (exposed_at, infectious_at) {
            node_intervals.exposed.push((infectious_at - exposed_at) as f64);
        }
        if let Some(infectious_at) = infectious_at {
            let end = match (quarantined_at, recovered_at) {
                (Some(quarantined_at), Some(recovered_at)) => Some(quarantined_at.min(recovered_at)),
                (quarantined_at, recovered_at) => quarantined_at.or(recovered_at),
            };
            if let Some(end) = end {
                node_intervals
                    .effective_infectious
                    .push((end as i64 - infectious_at as i64) as f64);
            }
        }
    }

    for (group, summary) in &mut groups {
        summary.adoption_rate = ratio(summary.adopters, summary.size);
        if let Some(intervals) = intervals.get(group) {
            summary.avg_exposed_interval = mean(&intervals.exposed);
            summary.avg_effective_infectious_interval = mean(&intervals.effective_infectious);
        }
    }
    groups
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn status_label(status: TrialStatus) -> &'static str {
    match status {
        TrialStatus::BurnedOut => "burned_out",
        TrialStatus::TimedOut => "timed_out",
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}
