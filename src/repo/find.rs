use serde_json::Value;
use tracing::trace;

use super::GraphRepository;
use crate::error::Result;
use crate::model::Node;
use crate::query::matcher::matches_node_query;
use crate::query::selector::{NodeQuery, Selector};
use crate::view::NodeModel;

impl GraphRepository {
    /// Resolves a selector to node models.
    ///
    /// An id or id-list selector fails with `NotFound` when any id is
    /// missing. A query selector scans nodes of the declared kind in
    /// insertion order. A query-list selector concatenates the results of
    /// each branch; duplicates are kept unless
    /// [`RepoOptions::dedup_disjunctive_finds`](super::RepoOptions) is set.
    pub fn find<S: Into<Selector>>(&self, selector: S) -> Result<Vec<NodeModel<'_>>> {
        let nodes = self.find_nodes(&selector.into())?;
        Ok(nodes.into_iter().map(|n| NodeModel::new(self, n)).collect())
    }

    /// Parses a raw selector document, then resolves it as [`find`] does.
    ///
    /// [`find`]: GraphRepository::find
    pub fn find_value(&self, selector: &Value) -> Result<Vec<NodeModel<'_>>> {
        let selector = Selector::parse(selector)?;
        self.find(selector)
    }

    /// Resolves a single id to its model.
    pub fn find_by_id(&self, id: &str) -> Result<NodeModel<'_>> {
        self.get_model(id)
    }

    pub(crate) fn find_nodes(&self, selector: &Selector) -> Result<Vec<&Node>> {
        let found = match selector {
            Selector::Id(id) => vec![self.node(id)?],
            Selector::Ids(ids) => {
                let mut nodes = Vec::with_capacity(ids.len());
                for id in ids {
                    nodes.push(self.node(id)?);
                }
                nodes
            }
            Selector::Query(query) => self.find_by_query(query)?,
            Selector::Queries(queries) => {
                let mut nodes = Vec::new();
                for query in queries {
                    nodes.extend(self.find_by_query(query)?);
                }
                if self.options().dedup_disjunctive_finds {
                    let mut seen = std::collections::HashSet::new();
                    nodes.retain(|node| seen.insert(node.id.clone()));
                }
                nodes
            }
        };
        trace!(count = found.len(), "resolved selector");
        Ok(found)
    }

    fn find_by_query(&self, query: &NodeQuery) -> Result<Vec<&Node>> {
        let mut matched = Vec::new();
        for node in self.nodes() {
            if node.kind != query.kind {
                continue;
            }
            if matches_node_query(self, node, &query.fields, "$")? {
                matched.push(node);
            }
        }
        Ok(matched)
    }
}
