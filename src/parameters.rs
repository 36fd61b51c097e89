/*!

Trial configuration.

`A` (adoption), `W` (edge activation) and `C` (tracing) are polymorphic: a constant probability
applied independently to every node or edge, one of a few named structured scenarios, or an
arbitrary rule `(network, entity, rng) -> value`. Whatever the shape, it is resolved once per
trial into concrete per-node / per-edge values by `population::initialize_trial`.

Configuration files are JSON. Every key is read and checked on its own so that a bad file is
reported against the parameter it got wrong:

A rate given as a bare number is a constant:

```json
{
  "A": 0.5,
  "W": { "constant": 0.5 },
  "C": { "knockout_qr": { "q": 0.2, "r": 1.0 } },
  "beta_hat": 0.4,
  "alpha": 0.25,
  "gamma": 0.1,
  "zeta": 0.1,
  "limit": 10,
  "max_steps": 5000,
  "seed": 42
}
```

*/

use crate::{
    context::{Context, DataPlugin},
    network::{EdgeId, EdgeKind, Layout, Network, NodeId},
    IxaError,
};
use rand::{Rng, RngCore};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::{fmt, path::Path, sync::Arc};

pub type NodeRule = Arc<dyn Fn(&Network, NodeId, &mut dyn RngCore) -> f64 + Send + Sync>;
pub type EdgeRule = Arc<dyn Fn(&Network, EdgeId, &mut dyn RngCore) -> f64 + Send + Sync>;

/// How the adoption probability of a node is chosen.
#[derive(Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRate {
    Constant(f64),
    /// Cohort 0 adopts with probability `mu + delta`, every other cohort with `mu - delta`.
    /// Needs cohort labels on the network.
    Cohort { mu: f64, delta: f64 },
    #[serde(skip)]
    Rule(NodeRule),
}

/// How a per-edge probability (`w` or `c`) is chosen.
#[derive(Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRate {
    Constant(f64),
    /// `|nodes| / |edges|`: one expected contact per node per step when used for `W`.
    OnePerNode,
    /// Long-range edges get 1.0 with probability `q` and 0.0 otherwise; local edges get 1.0.
    Knockout { q: f64 },
    /// Long-range edges get 1.0 with probability `q`, local edges with probability `r`.
    KnockoutQr { q: f64, r: f64 },
    #[serde(skip)]
    Rule(EdgeRule),
}

// The shapes a rate can take in a configuration file: a bare probability, or one of the tagged
// forms. Rules only exist in code.
#[derive(Deserialize)]
#[serde(untagged)]
enum RateInput<T> {
    Bare(f64),
    Tagged(T),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum NodeRateInput {
    Constant(f64),
    Cohort { mu: f64, delta: f64 },
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum EdgeRateInput {
    Constant(f64),
    OnePerNode,
    Knockout { q: f64 },
    KnockoutQr { q: f64, r: f64 },
}

impl<'de> Deserialize<'de> for NodeRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RateInput::<NodeRateInput>::deserialize(deserializer)? {
            RateInput::Bare(p) | RateInput::Tagged(NodeRateInput::Constant(p)) => NodeRate::Constant(p),
            RateInput::Tagged(NodeRateInput::Cohort { mu, delta }) => NodeRate::Cohort { mu, delta },
        })
    }
}

impl<'de> Deserialize<'de> for EdgeRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RateInput::<EdgeRateInput>::deserialize(deserializer)? {
            RateInput::Bare(p) | RateInput::Tagged(EdgeRateInput::Constant(p)) => EdgeRate::Constant(p),
            RateInput::Tagged(EdgeRateInput::OnePerNode) => EdgeRate::OnePerNode,
            RateInput::Tagged(EdgeRateInput::Knockout { q }) => EdgeRate::Knockout { q },
            RateInput::Tagged(EdgeRateInput::KnockoutQr { q, r }) => EdgeRate::KnockoutQr { q, r },
        })
    }
}

impl NodeRate {
    pub fn rule(rule: impl Fn(&Network, NodeId, &mut dyn RngCore) -> f64 + Send + Sync + 'static) -> Self {
        NodeRate::Rule(Arc::new(rule))
    }

    /// The adoption probability for `node_id`.
    pub fn resolve(&self, network: &Network, node_id: NodeId, rng: &mut dyn RngCore) -> f64 {
        match self {
            NodeRate::Constant(p) => *p,
            NodeRate::Cohort { mu, delta } => match network.group(node_id) {
                Some(0) => mu + delta,
                _ => mu - delta,
            },
            NodeRate::Rule(rule) => rule(network, node_id, rng),
        }
    }

    fn validate(&self, name: &'static str, network: &Network) -> Result<(), IxaError> {
        match self {
            NodeRate::Constant(p) => check_probability(name, *p),
            NodeRate::Cohort { mu, delta } => {
                if !network.has_groups() {
                    return Err(IxaError::invalid_parameter(
                        name,
                        "cohort adoption needs cohort labels on the network",
                    ));
                }
                check_probability(name, mu + delta)?;
                check_probability(name, mu - delta)
            }
            NodeRate::Rule(_) => Ok(()),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            NodeRate::Constant(p) => p.to_string(),
            NodeRate::Cohort { mu, delta } => format!("cohort(mu={mu}, delta={delta})"),
            NodeRate::Rule(_) => "rule".to_string(),
        }
    }
}

impl EdgeRate {
    pub fn rule(rule: impl Fn(&Network, EdgeId, &mut dyn RngCore) -> f64 + Send + Sync + 'static) -> Self {
        EdgeRate::Rule(Arc::new(rule))
    }

    /// The value for `edge_id`. Knockout rates draw from `rng`.
    #[allow(clippy::cast_precision_loss)]
    pub fn resolve(&self, network: &Network, edge_id: EdgeId, rng: &mut dyn RngCore) -> f64 {
        let keep = |rng: &mut dyn RngCore, p: f64| if rng.random_bool(p) { 1.0 } else { 0.0 };
        match self {
            EdgeRate::Constant(p) => *p,
            EdgeRate::OnePerNode => network.node_count() as f64 / network.edge_count() as f64,
            EdgeRate::Knockout { q } => match network.classify_edge(edge_id) {
                EdgeKind::LongRange => keep(rng, *q),
                EdgeKind::Local => 1.0,
            },
            EdgeRate::KnockoutQr { q, r } => match network.classify_edge(edge_id) {
                EdgeKind::LongRange => keep(rng, *q),
                EdgeKind::Local => keep(rng, *r),
            },
            EdgeRate::Rule(rule) => rule(network, edge_id, rng),
        }
    }

    fn validate(&self, name: &'static str, network: &Network) -> Result<(), IxaError> {
        let needs_layout = || {
            if network.layout() == Layout::Unstructured {
                Err(IxaError::invalid_parameter(
                    name,
                    "knockout rates need a ring or grid network to tell local from long-range edges",
                ))
            } else {
                Ok(())
            }
        };
        match self {
            EdgeRate::Constant(p) => check_probability(name, *p),
            EdgeRate::OnePerNode => {
                if network.edge_count() == 0 {
                    Err(IxaError::invalid_parameter(name, "one_per_node needs at least one edge"))
                } else {
                    Ok(())
                }
            }
            EdgeRate::Knockout { q } => {
                check_probability(name, *q)?;
                needs_layout()
            }
            EdgeRate::KnockoutQr { q, r } => {
                check_probability(name, *q)?;
                check_probability(name, *r)?;
                needs_layout()
            }
            EdgeRate::Rule(_) => Ok(()),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            EdgeRate::Constant(p) => p.to_string(),
            EdgeRate::OnePerNode => "one_per_node".to_string(),
            EdgeRate::Knockout { q } => format!("knockout(q={q})"),
            EdgeRate::KnockoutQr { q, r } => format!("knockout(q={q}, r={r})"),
            EdgeRate::Rule(_) => "rule".to_string(),
        }
    }
}

impl From<f64> for NodeRate {
    fn from(p: f64) -> Self {
        NodeRate::Constant(p)
    }
}

impl From<f64> for EdgeRate {
    fn from(p: f64) -> Self {
        EdgeRate::Constant(p)
    }
}

impl fmt::Debug for NodeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRate({})", self.label())
    }
}

impl fmt::Debug for EdgeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeRate({})", self.label())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Parameters {
    /// Adoption rate or rule.
    #[serde(rename = "A")]
    pub adoption: NodeRate,
    /// Per-step edge activation probability or rule.
    #[serde(rename = "W")]
    pub activation: EdgeRate,
    /// Probability that an active adopter-adopter edge is recorded, or a rule for it.
    #[serde(rename = "C")]
    pub tracing: EdgeRate,
    /// Transmission probability across an active infectious-susceptible edge.
    pub beta_hat: f64,
    /// Exposed -> Infectious per-step probability.
    pub alpha: f64,
    /// Infectious -> Recovered per-step probability.
    pub gamma: f64,
    /// Per-step probability that an infectious node shows symptoms and gets tested.
    pub zeta: f64,
    /// How many past steps of contact history a positive test traces.
    pub limit: usize,
    /// Optional ceiling on the number of steps in one trial.
    pub max_steps: Option<usize>,
    /// Base seed; trial `i` runs with `seed + i`.
    pub seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            adoption: NodeRate::Constant(0.0),
            activation: EdgeRate::Constant(0.5),
            tracing: EdgeRate::Constant(1.0),
            beta_hat: 0.4,
            alpha: 0.25,
            gamma: 0.1,
            zeta: 0.1,
            limit: 10,
            max_steps: None,
            seed: 0,
        }
    }
}

const REQUIRED_KEYS: [&str; 8] = ["A", "W", "C", "beta_hat", "alpha", "gamma", "zeta", "limit"];
const OPTIONAL_KEYS: [&str; 2] = ["max_steps", "seed"];

impl Parameters {
    /// Checks every parameter that can be checked without drawing random numbers. Rule outputs
    /// are checked as they are resolved.
    pub fn validate(&self, network: &Network) -> Result<(), IxaError> {
        self.adoption.validate("A", network)?;
        self.activation.validate("W", network)?;
        self.tracing.validate("C", network)?;
        check_probability("beta_hat", self.beta_hat)?;
        check_probability("alpha", self.alpha)?;
        check_probability("gamma", self.gamma)?;
        check_probability("zeta", self.zeta)?;
        if network.node_count() == 0 {
            return Err(IxaError::NetworkError(
                "cannot seed an infection in an empty network".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, IxaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, IxaError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reads parameters from a JSON object. Missing required keys, unknown keys and values of
    /// the wrong shape are all rejected with the offending key named.
    pub fn from_json_value(value: Value) -> Result<Self, IxaError> {
        let Value::Object(mut map) = value else {
            return Err(IxaError::IxaError(
                "parameters must be a JSON object".to_string(),
            ));
        };

        if let Some(unknown) = map
            .keys()
            .find(|key| !REQUIRED_KEYS.contains(&key.as_str()) && !OPTIONAL_KEYS.contains(&key.as_str()))
        {
            return Err(IxaError::IxaError(format!("unrecognized parameter `{unknown}`")));
        }

        Ok(Parameters {
            adoption: required(&mut map, "A")?,
            activation: required(&mut map, "W")?,
            tracing: required(&mut map, "C")?,
            beta_hat: required(&mut map, "beta_hat")?,
            alpha: required(&mut map, "alpha")?,
            gamma: required(&mut map, "gamma")?,
            zeta: required(&mut map, "zeta")?,
            limit: required(&mut map, "limit")?,
            max_steps: optional(&mut map, "max_steps")?,
            seed: optional(&mut map, "seed")?.unwrap_or(0),
        })
    }
}

fn required<T: DeserializeOwned>(map: &mut Map<String, Value>, name: &'static str) -> Result<T, IxaError> {
    let value = map
        .remove(name)
        .ok_or_else(|| IxaError::invalid_parameter(name, "missing"))?;
    serde_json::from_value(value).map_err(|error| IxaError::invalid_parameter(name, error.to_string()))
}

fn optional<T: DeserializeOwned>(map: &mut Map<String, Value>, name: &'static str) -> Result<Option<T>, IxaError> {
    match map.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|error| IxaError::invalid_parameter(name, error.to_string())),
    }
}

pub(crate) fn check_probability(name: &'static str, p: f64) -> Result<(), IxaError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(IxaError::invalid_parameter(
            name,
            format!("must be a probability in [0, 1], got {p}"),
        ))
    }
}

struct ParametersPlugin {
    parameters: Option<Parameters>,
}

impl DataPlugin for ParametersPlugin {
    const new: &'static dyn Fn() -> Self = &|| ParametersPlugin { parameters: None };
}

pub trait ContextParametersExt {
    fn set_parameters(&mut self, parameters: Parameters);

    /// The parameters of the running trial. Panics if `set_parameters` was never called.
    fn get_params(&self) -> &Parameters;
}

impl ContextParametersExt for Context {
    fn set_parameters(&mut self, parameters: Parameters) {
        self.get_data_container_mut::<ParametersPlugin>().parameters = Some(parameters);
    }

    fn get_params(&self) -> &Parameters {
        self.get_data_container::<ParametersPlugin>()
            .and_then(|plugin| plugin.parameters.as_ref())
            .unwrap_or_else(|| panic!("Parameters not initialized"))
    }
}
