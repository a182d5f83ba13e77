use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternMatching {
    FixedLen,
    VariableLen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysClause {
    /// `None` entries match any key value at that position.
    pub keys: Vec<Option<String>>,
    pub pattern_matching: PatternMatching,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeClause {
    pub operator: LogicalOperator,
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clause {
    Keys(KeysClause),
    Composite(CompositeClause),
}

impl Clause {
    /// Every entity holding `model` under `namespace`, whatever its keys.
    pub fn model(namespace: &str, model: &str) -> Self {
        Clause::Keys(KeysClause {
            keys: Vec::new(),
            pattern_matching: PatternMatching::VariableLen,
            models: vec![model_tag(namespace, model)],
        })
    }

    pub fn or(clauses: Vec<Clause>) -> Self {
        Clause::Composite(CompositeClause {
            operator: LogicalOperator::Or,
            clauses,
        })
    }
}

/// Wire name of a model: `<namespace>-<Model>`.
pub fn model_tag(namespace: &str, model: &str) -> String {
    format!("{namespace}-{model}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub clause: Clause,
    /// Kept `false` so each result carries the hashed key used as its identifier.
    #[serde(default)]
    pub no_hashed_keys: bool,
}

impl Query {
    /// OR-union of the kinds selected in `selection`; `None` when nothing is selected and the
    /// caller must not hit the network.
    pub fn compose<S: Selection>(selection: &S, namespace: &str) -> Option<Self> {
        let clauses = selection.clauses(namespace);
        if clauses.is_empty() {
            return None;
        }
        Some(Self {
            clause: Clause::or(clauses),
            no_hashed_keys: false,
        })
    }
}

/// A flag set over model kinds, together with the discriminator for the models of its topic.
pub trait Selection: Clone + Send + Sync + 'static {
    type Model: Clone + std::fmt::Debug + Send + 'static;

    /// Name used for logging and for the per-topic subscription slot.
    const TOPIC: &'static str;

    fn clauses(&self, namespace: &str) -> Vec<Clause>;

    fn is_queryable(&self) -> bool;

    /// Classify one raw record. Each known model name is checked and parsed independently, so
    /// one malformed model does not hide the others. Unknown names are ignored.
    fn discriminate(entity: &Entity, namespace: &str) -> Vec<Result<Self::Model, ParseError>>;
}
