//! Join trees.
//!
//! A report pulls columns from tables related to its base model. The join
//! tree records which tables are joined (nested by relationship) and which
//! columns each contributes. Its serialized form is the include document the
//! query engine reads:
//!
//! ```json
//! {"hardware": {"columns": ["cpu_speed"], "include": {"disks": {"columns": ["size"]}}}}
//! ```
//!
//! Tables keep insertion order, so searching the tree is deterministic.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tables joined at one level, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinTree {
    tables: Vec<(String, JoinNode)>,
}

/// One joined table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinNode {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "JoinTree::is_empty")]
    pub include: JoinTree,
}

impl JoinTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &JoinNode)> {
        self.tables.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn table(&self, name: &str) -> Option<&JoinNode> {
        self.tables.iter().find(|(t, _)| t == name).map(|(_, node)| node)
    }

    fn table_mut(&mut self, name: &str) -> &mut JoinNode {
        let index = match self.tables.iter().position(|(t, _)| t == name) {
            Some(index) => index,
            None => {
                self.tables.push((name.to_string(), JoinNode::default()));
                self.tables.len() - 1
            }
        };
        &mut self.tables[index].1
    }

    /// The node at the end of `path`, if it was ever inserted.
    pub fn node(&self, path: &[String]) -> Option<&JoinNode> {
        let (first, rest) = path.split_first()?;
        let node = self.table(first)?;
        if rest.is_empty() {
            Some(node)
        } else {
            node.include.node(rest)
        }
    }

    /// Record that `column` is pulled from the table at the end of `path`.
    ///
    /// Missing nodes along the path are created. Inserting the same column
    /// twice leaves the tree unchanged. An empty path names the base model
    /// and is ignored.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S], column: &str) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        let node = self.table_mut(first.as_ref());
        if rest.is_empty() {
            if !node.columns.iter().any(|c| c == column) {
                node.columns.push(column.to_string());
            }
        } else {
            node.include.insert(rest, column);
        }
    }

    /// Find the join path that pulls `column`.
    ///
    /// `column` may carry a partial table hint (`"disks.size"`), in which case
    /// only paths ending with the hinted tables match. The search is depth
    /// first: a node's own columns are checked before its children, children
    /// in insertion order. The first match wins, so two tables exposing the
    /// same column name resolve to whichever was joined first.
    pub fn resolve_join_path(&self, column: &str) -> Option<Vec<String>> {
        let mut parts: Vec<&str> = column.split('.').collect();
        let field = parts.pop()?;
        let mut path = Vec::new();
        self.search(&parts, field, &mut path).then_some(path)
    }

    fn search(&self, hint: &[&str], field: &str, path: &mut Vec<String>) -> bool {
        for (table, node) in &self.tables {
            path.push(table.clone());
            if node.columns.iter().any(|c| c == field) && ends_with(path, hint) {
                return true;
            }
            if node.include.search(hint, field, path) {
                return true;
            }
            path.pop();
        }
        false
    }
}

fn ends_with(path: &[String], hint: &[&str]) -> bool {
    hint.len() <= path.len()
        && path[path.len() - hint.len()..]
            .iter()
            .zip(hint)
            .all(|(a, b)| a == b)
}

impl Serialize for JoinTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for (table, node) in &self.tables {
            map.serialize_entry(table, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for JoinTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = JoinTree;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of table names to join nodes")
            }

            fn visit_map<A>(self, mut access: A) -> Result<JoinTree, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut tree = JoinTree::new();
                while let Some((table, node)) = access.next_entry::<String, JoinNode>()? {
                    tree.tables.push((table, node));
                }
                Ok(tree)
            }
        }

        deserializer.deserialize_map(TreeVisitor)
    }
}
