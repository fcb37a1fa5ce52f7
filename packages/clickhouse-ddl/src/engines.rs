//! MergeTree-family table engines.
//!
//! All supported engines share the legacy MergeTree parameter block
//!
//! ```text
//! Name(date_column, [sampling,] (key...), index_granularity[, engine specific...])
//! ```
//!
//! The sampling expression changes the position of the key tuple, so the
//! block is modelled as an [`ArgShape`] rather than a list of optional
//! arguments. Engine specific arguments always follow the granularity.

use std::fmt;

use itertools::Itertools;

use crate::expr::Expr;

pub const DEFAULT_INDEX_GRANULARITY: u64 = 8192;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeTreeParams {
    date_column: Expr,
    key: Vec<Expr>,
    sampling: Option<Expr>,
    index_granularity: u64,
}

/// Positional layout of the shared parameter block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgShape<'a> {
    Plain {
        date_column: &'a Expr,
        key: &'a [Expr],
    },
    WithSampling {
        date_column: &'a Expr,
        sampling: &'a Expr,
        key: &'a [Expr],
    },
}

impl MergeTreeParams {
    pub fn new<K, E>(date_column: impl Into<Expr>, key: K) -> Self
    where
        K: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self {
            date_column: date_column.into(),
            key: key.into_iter().map(Into::into).collect(),
            sampling: None,
            index_granularity: DEFAULT_INDEX_GRANULARITY,
        }
    }

    pub fn with_sampling(mut self, sampling: impl Into<Expr>) -> Self {
        self.sampling = Some(sampling.into());
        self
    }

    pub fn with_index_granularity(mut self, index_granularity: u64) -> Self {
        self.index_granularity = index_granularity;
        self
    }

    pub fn date_column(&self) -> &Expr {
        &self.date_column
    }

    pub fn key(&self) -> &[Expr] {
        &self.key
    }

    pub fn sampling(&self) -> Option<&Expr> {
        self.sampling.as_ref()
    }

    pub fn index_granularity(&self) -> u64 {
        self.index_granularity
    }

    pub fn shape(&self) -> ArgShape<'_> {
        match &self.sampling {
            Some(sampling) => ArgShape::WithSampling {
                date_column: &self.date_column,
                sampling,
                key: &self.key,
            },
            None => ArgShape::Plain {
                date_column: &self.date_column,
                key: &self.key,
            },
        }
    }

    pub fn into_engine(self) -> Engine {
        Engine::MergeTree(self)
    }

    fn render_args(&self) -> Vec<String> {
        // The key is rendered verbatim: a date column listed in the key shows
        // up twice, once standalone and once inside the tuple.
        let mut args = match self.shape() {
            ArgShape::Plain { date_column, key } => {
                vec![date_column.to_string(), render_tuple(key)]
            }
            ArgShape::WithSampling {
                date_column,
                sampling,
                key,
            } => vec![
                date_column.to_string(),
                sampling.to_string(),
                render_tuple(key),
            ],
        };
        args.push(self.index_granularity.to_string());
        args
    }
}

fn render_tuple(items: &[Expr]) -> String {
    if items.is_empty() {
        "tuple()".to_string()
    } else {
        format!("({})", items.iter().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Engine {
    MergeTree(MergeTreeParams),
    AggregatingMergeTree(MergeTreeParams),
    CollapsingMergeTree {
        params: MergeTreeParams,
        sign_column: Expr,
    },
    SummingMergeTree {
        params: MergeTreeParams,
        summing_columns: Vec<Expr>,
    },
    ReplacingMergeTree {
        params: MergeTreeParams,
        version_column: Option<Expr>,
    },
}

impl Engine {
    pub fn name(&self) -> &'static str {
        match self {
            Engine::MergeTree(_) => "MergeTree",
            Engine::AggregatingMergeTree(_) => "AggregatingMergeTree",
            Engine::CollapsingMergeTree { .. } => "CollapsingMergeTree",
            Engine::SummingMergeTree { .. } => "SummingMergeTree",
            Engine::ReplacingMergeTree { .. } => "ReplacingMergeTree",
        }
    }

    pub fn params(&self) -> &MergeTreeParams {
        match self {
            Engine::MergeTree(params) | Engine::AggregatingMergeTree(params) => params,
            Engine::CollapsingMergeTree { params, .. }
            | Engine::SummingMergeTree { params, .. }
            | Engine::ReplacingMergeTree { params, .. } => params,
        }
    }

    /// Rendered positional arguments, in order.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = self.params().render_args();
        match self {
            Engine::MergeTree(_) | Engine::AggregatingMergeTree(_) => {}
            Engine::CollapsingMergeTree { sign_column, .. } => args.push(sign_column.to_string()),
            Engine::SummingMergeTree {
                summing_columns, ..
            } => {
                if !summing_columns.is_empty() {
                    args.push(render_tuple(summing_columns));
                }
            }
            Engine::ReplacingMergeTree { version_column, .. } => {
                if let Some(version) = version_column {
                    args.push(version.to_string());
                }
            }
        }
        args
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.arguments().join(", "))
    }
}

impl From<MergeTreeParams> for Engine {
    fn from(params: MergeTreeParams) -> Self {
        Engine::MergeTree(params)
    }
}
