//! Merging per-platform forests
//!
//! Every platform's source is parsed into its own forest of [`DocNode`]s. The
//! forests are then folded together by name: a node that already exists picks
//! up the new platform's id, raw fragment and data; a node that does not is
//! appended with only that platform attached.

use crate::diagnostics::DocsResult;
use crate::node::{DocNode, PlatformId};
use indexmap::IndexMap;

/// Merges one forest per platform into a single forest
#[derive(Debug, Clone)]
pub struct PlatformMerger {
    platforms: Vec<PlatformId>,
}

impl PlatformMerger {
    /// Create a merger for platforms in their canonical order
    pub fn new<I, S>(platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlatformId>,
    {
        Self {
            platforms: platforms.into_iter().map(Into::into).collect(),
        }
    }

    /// Configured platforms
    pub fn platforms(&self) -> &[PlatformId] {
        &self.platforms
    }

    /// Load a forest for every platform and merge them.
    ///
    /// Children are sorted by declaration line once all platforms have been
    /// merged, and platform lists are put back into canonical order.
    pub fn merge_forest<F>(&self, mut load: F) -> DocsResult<Vec<DocNode>>
    where
        F: FnMut(&str) -> DocsResult<Vec<DocNode>>,
    {
        let mut forest: Vec<DocNode> = Vec::new();
        for platform in &self.platforms {
            let incoming = load(platform)?;
            tracing::debug!(platform = %platform, nodes = incoming.len(), "merging platform forest");
            merge_children(&mut forest, incoming);
        }
        for node in &mut forest {
            self.finish(node);
        }
        Ok(forest)
    }

    /// Sort children and normalize platform order, recursively
    pub fn finish(&self, node: &mut DocNode) {
        let order = &self.platforms;
        node.walk_mut(&mut |n| {
            n.children.sort_by_key(|c| c.position);
            n.platforms.sort_by_key(|p| rank(order, p));
            n.platform_ids.sort_by(|a, _, b, _| rank(order, a).cmp(&rank(order, b)));
            n.data.sort_by(|a, _, b, _| rank(order, a).cmp(&rank(order, b)));
            n.raw.sort_by(|a, _, b, _| rank(order, a).cmp(&rank(order, b)));
        });
    }
}

fn rank(order: &[PlatformId], platform: &str) -> usize {
    order
        .iter()
        .position(|p| p == platform)
        .unwrap_or(order.len())
}

/// Fold `incoming` into `existing` (same name, same scope)
pub fn merge_node(existing: &mut DocNode, incoming: DocNode) {
    let DocNode {
        platforms,
        mut platform_ids,
        mut data,
        mut raw,
        children,
        def,
        ..
    } = incoming;

    for platform in platforms {
        let id = platform_ids.shift_remove(&platform).unwrap_or_default();
        existing.add_platform(&platform, id, raw.shift_remove(&platform));
        if let Some(d) = data.shift_remove(&platform) {
            existing.data.insert(platform, d);
        }
    }

    merge_children(&mut existing.children, children);

    if let crate::node::DocNodeDef::Group {
        groups,
        placeholders,
    } = def
    {
        if let crate::node::DocNodeDef::Group {
            groups: existing_groups,
            placeholders: existing_placeholders,
        } = &mut existing.def
        {
            merge_children(existing_groups, groups);
            for p in placeholders {
                if !existing_placeholders.contains(&p) {
                    existing_placeholders.push(p);
                }
            }
        }
    }
}

/// Merge a list of sibling nodes by name
pub fn merge_children(existing: &mut Vec<DocNode>, incoming: Vec<DocNode>) {
    let mut index: IndexMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, n)| (n.name.clone(), i))
        .collect();

    for node in incoming {
        match index.get(&node.name) {
            Some(&i) => merge_node(&mut existing[i], node),
            None => {
                index.insert(node.name.clone(), existing.len());
                existing.push(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DocNodeDef, MemberKind, PlatformData};
    use pretty_assertions::assert_eq;

    fn member(name: &str, platform: &str, line: usize, summary: &str) -> DocNode {
        let mut node = DocNode::new(
            DocNodeDef::Member {
                kind: MemberKind::Function,
            },
            name,
            format!("G/#{}", name),
            format!("/docs/c/G/#{}", name),
        )
        .at_position(line);
        node.add_platform(platform, format!("{}_{}", platform, name), None);
        node.data.insert(
            platform.into(),
            PlatformData {
                summary: summary.into(),
                ..Default::default()
            },
        );
        node
    }

    fn group(platform: &str, members: Vec<DocNode>) -> DocNode {
        let mut g = DocNode::new(DocNodeDef::group(), "G", "G/", "/docs/c/G/");
        g.add_platform(platform, "group___g", None);
        g.children = members;
        g
    }

    fn forest_for(platform: &str) -> Vec<DocNode> {
        match platform {
            "aplite" => vec![group(
                "aplite",
                vec![member("b", "aplite", 20, "B"), member("a", "aplite", 10, "A")],
            )],
            _ => vec![group(
                "basalt",
                vec![
                    member("c", "basalt", 15, "C"),
                    member("a", "basalt", 10, "A on basalt"),
                ],
            )],
        }
    }

    #[test]
    fn test_merge_by_name_and_sort_once() {
        let merger = PlatformMerger::new(["aplite", "basalt"]);
        let forest = merger.merge_forest(|p| Ok(forest_for(p))).unwrap();

        assert_eq!(forest.len(), 1);
        let g = &forest[0];
        let names: Vec<&str> = g.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);

        let a = &g.children[0];
        assert_eq!(a.platforms, vec!["aplite", "basalt"]);
        assert_eq!(a.data["aplite"].summary, "A");
        assert_eq!(a.data["basalt"].summary, "A on basalt");
        assert!(!a.is_uniform());

        assert_eq!(g.children[1].platforms, vec!["basalt"]);
        assert_eq!(g.children[2].platforms, vec!["aplite"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let merger = PlatformMerger::new(["aplite", "basalt"]);
        let once = merger.merge_forest(|p| Ok(forest_for(p))).unwrap();

        let mut twice = once.clone();
        merge_children(&mut twice, forest_for("aplite"));
        for node in &mut twice {
            merger.finish(node);
        }
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let forward = PlatformMerger::new(["aplite", "basalt"])
            .merge_forest(|p| Ok(forest_for(p)))
            .unwrap();

        let mut reversed = Vec::new();
        merge_children(&mut reversed, forest_for("basalt"));
        merge_children(&mut reversed, forest_for("aplite"));
        let merger = PlatformMerger::new(["aplite", "basalt"]);
        for node in &mut reversed {
            merger.finish(node);
        }

        let names = |f: &[DocNode]| {
            f[0].children
                .iter()
                .map(|c| (c.name.clone(), c.platforms.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&forward), names(&reversed));
        assert_eq!(forward[0].platforms, reversed[0].platforms);
    }
}
