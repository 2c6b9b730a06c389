//! Core documentation node types
//!
//! `DocNode` is the single structure every source format is normalized into.
//! A node is identified by its name within its parent scope; the raw ids a
//! source format assigns are recorded per platform but never used to decide
//! whether two fragments describe the same thing.

use crate::diagnostics::DocsResult;
use crate::fragment::Element;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hardware platform identifier such as `aplite` or `basalt`
pub type PlatformId = String;

/// Platform key used by sources that do not vary per platform
pub const ANY_PLATFORM: &str = "any";

/// Kind of a member node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Function,
    Enum,
    Define,
    Typedef,
    Variable,
    Method,
    Property,
    Event,
    Constant,
    Member,
}

impl MemberKind {
    /// Doxygen `memberdef/@kind` value
    pub fn from_doxygen(kind: &str) -> Option<MemberKind> {
        match kind {
            "function" => Some(MemberKind::Function),
            "enum" => Some(MemberKind::Enum),
            "define" => Some(MemberKind::Define),
            "typedef" => Some(MemberKind::Typedef),
            "variable" => Some(MemberKind::Variable),
            _ => None,
        }
    }

    /// JSON `kind` value; anything unrecognised is a plain member
    pub fn from_js(kind: &str) -> MemberKind {
        match kind {
            "function" => MemberKind::Function,
            "typedef" => MemberKind::Typedef,
            "event" => MemberKind::Event,
            "constant" => MemberKind::Constant,
            "property" => MemberKind::Property,
            "method" => MemberKind::Method,
            _ => MemberKind::Member,
        }
    }

    /// Get display string
    pub fn display(&self) -> &'static str {
        match self {
            MemberKind::Function => "function",
            MemberKind::Enum => "enum",
            MemberKind::Define => "define",
            MemberKind::Typedef => "typedef",
            MemberKind::Variable => "variable",
            MemberKind::Method => "method",
            MemberKind::Property => "property",
            MemberKind::Event => "event",
            MemberKind::Constant => "constant",
            MemberKind::Member => "member",
        }
    }
}

/// Kind of a class-like node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Struct,
    Union,
    Class,
    Enum,
    Exception,
    Interface,
    Protocol,
    Category,
}

impl ClassKind {
    /// Get display string
    pub fn display(&self) -> &'static str {
        match self {
            ClassKind::Struct => "struct",
            ClassKind::Union => "union",
            ClassKind::Class => "class",
            ClassKind::Enum => "enum",
            ClassKind::Exception => "exception",
            ClassKind::Interface => "interface",
            ClassKind::Protocol => "protocol",
            ClassKind::Category => "category",
        }
    }
}

/// Specific definition for each node variant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum DocNodeDef {
    /// A documentation group (C group, JS module, Java package)
    Group {
        /// Nested groups, in discovery order
        groups: Vec<DocNode>,
        /// Platforms for which the group is an empty stand-in
        #[serde(skip_serializing_if = "Vec::is_empty")]
        placeholders: Vec<PlatformId>,
    },
    /// Function, enum, define, typedef, method...
    Member { kind: MemberKind },
    /// Struct, union, class, interface, protocol...
    Class { kind: ClassKind },
    /// Field of a struct or union
    Field,
    /// Value of an enum
    EnumValue,
}

impl DocNodeDef {
    /// Empty group definition
    pub fn group() -> Self {
        DocNodeDef::Group {
            groups: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    /// Kind string used for symbols
    pub fn kind_name(&self) -> &'static str {
        match self {
            DocNodeDef::Group { .. } => "group",
            DocNodeDef::Member { kind } => kind.display(),
            DocNodeDef::Class { kind } => kind.display(),
            DocNodeDef::Field => "field",
            DocNodeDef::EnumValue => "enumvalue",
        }
    }
}

/// Documented parameter of a member signature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    /// Rendered type, with links to known types
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub type_html: String,
}

/// Parameter documentation entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamDoc {
    /// Parameter name, with the direction appended when the source gives one
    pub name: String,
    pub summary: String,
}

/// Rendered documentation of one node on one platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformData {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub type_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub argsstring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub initializer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub params: Vec<ParamInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<ParamDoc>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub returns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub see_also: Vec<String>,
    /// Further admonition sections by Doxygen kind
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub sections: IndexMap<String, Vec<String>>,
    /// Structured extras carried through from JSON sources
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub details: IndexMap<String, Value>,
    /// Full page body for scraped HTML sources
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contents: Option<String>,
}

/// A documented item: group, member, class, field or enum value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocNode {
    /// Raw id from the first platform that contributed the node
    pub id: String,
    pub name: String,
    /// Name-derived path relative to the source's url root
    pub path: String,
    pub url: String,
    /// Declaration line, used to order siblings
    pub position: usize,
    /// Platforms the node exists on
    pub platforms: Vec<PlatformId>,
    /// Raw id per platform
    pub platform_ids: IndexMap<PlatformId, String>,
    /// Rendered data per platform
    pub data: IndexMap<PlatformId, PlatformData>,
    pub children: Vec<DocNode>,
    #[serde(flatten)]
    pub def: DocNodeDef,
    /// Unprocessed per-platform source fragment
    #[serde(skip)]
    pub raw: IndexMap<PlatformId, Element>,
}

impl DocNode {
    /// Create a node with no platforms attached yet
    pub fn new(
        def: DocNodeDef,
        name: impl Into<String>,
        path: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            path: path.into(),
            url: url.into(),
            position: 0,
            platforms: Vec::new(),
            platform_ids: IndexMap::new(),
            data: IndexMap::new(),
            children: Vec::new(),
            def,
            raw: IndexMap::new(),
        }
    }

    /// Builder: set the declaration line
    pub fn at_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Kind string used for symbols
    pub fn kind_name(&self) -> &'static str {
        self.def.kind_name()
    }

    /// Record that the node exists on `platform`.
    ///
    /// Calling this again for the same platform replaces the id and raw
    /// fragment and leaves the platform list unchanged.
    pub fn add_platform(&mut self, platform: &str, id: impl Into<String>, raw: Option<Element>) {
        let id = id.into();
        if self.id.is_empty() {
            self.id = id.clone();
        }
        if !self.platforms.iter().any(|p| p == platform) {
            self.platforms.push(platform.to_string());
        }
        self.platform_ids.insert(platform.to_string(), id);
        match raw {
            Some(raw) => {
                self.raw.insert(platform.to_string(), raw);
            }
            None => {
                self.raw.shift_remove(platform);
            }
        }
    }

    /// Whether the node exists on `platform`
    pub fn has_platform(&self, platform: &str) -> bool {
        self.platforms.iter().any(|p| p == platform)
    }

    /// Children present on `platform`
    pub fn children_on<'a>(&'a self, platform: &'a str) -> impl Iterator<Item = &'a DocNode> + 'a {
        self.children.iter().filter(move |c| c.has_platform(platform))
    }

    /// Nested groups (empty for non-group nodes)
    pub fn groups(&self) -> &[DocNode] {
        match &self.def {
            DocNodeDef::Group { groups, .. } => groups,
            _ => &[],
        }
    }

    /// Mutable nested groups, when this node is a group
    pub fn groups_mut(&mut self) -> Option<&mut Vec<DocNode>> {
        match &mut self.def {
            DocNodeDef::Group { groups, .. } => Some(groups),
            _ => None,
        }
    }

    /// Children of a given member kind
    pub fn members_of(&self, kind: MemberKind) -> impl Iterator<Item = &DocNode> {
        self.children
            .iter()
            .filter(move |c| matches!(c.def, DocNodeDef::Member { kind: k } if k == kind))
    }

    /// Children of a given class kind
    pub fn classes_of(&self, kind: ClassKind) -> impl Iterator<Item = &DocNode> {
        self.children
            .iter()
            .filter(move |c| matches!(c.def, DocNodeDef::Class { kind: k } if k == kind))
    }

    /// Data for the preferred platform: the last platform in `order` the
    /// node has data for, falling back to any data at all
    pub fn preferred_data(&self, order: &[PlatformId]) -> Option<&PlatformData> {
        order
            .iter()
            .rev()
            .find_map(|p| self.data.get(p))
            .or_else(|| self.data.values().next())
    }

    /// Summary text, taken from rendered data or the raw brief description
    pub fn summary(&self, order: &[PlatformId]) -> String {
        if let Some(data) = self.preferred_data(order) {
            return data.summary.clone();
        }
        order
            .iter()
            .rev()
            .find_map(|p| self.raw.get(p))
            .or_else(|| self.raw.values().next())
            .and_then(|raw| raw.child("briefdescription"))
            .map(|brief| brief.text().trim().to_string())
            .unwrap_or_default()
    }

    /// True when the serialized data is identical on every platform the
    /// node exists on and every child is uniform too
    pub fn is_uniform(&self) -> bool {
        let mut serialized = self
            .platforms
            .iter()
            .map(|p| serde_json::to_string(&self.data.get(p)).unwrap_or_default());
        let first = serialized.next();
        let data_uniform = serialized.all(|s| Some(&s) == first.as_ref());
        data_uniform && self.children.iter().all(DocNode::is_uniform)
    }

    /// Configured platforms this node does not exist on
    pub fn missing_from<'a>(&self, configured: &'a [PlatformId]) -> Vec<&'a PlatformId> {
        configured.iter().filter(|p| !self.has_platform(p)).collect()
    }

    /// Like [`DocNode::is_uniform`], but a node or child missing from any of
    /// the `configured` platforms is not uniform. An empty list checks data only.
    pub fn is_uniform_across(&self, configured: &[PlatformId]) -> bool {
        if !self.missing_from(configured).is_empty() {
            return false;
        }
        let mut serialized = self
            .platforms
            .iter()
            .map(|p| serde_json::to_string(&self.data.get(p)).unwrap_or_default());
        let first = serialized.next();
        serialized.all(|s| Some(&s) == first.as_ref())
            && self.children.iter().all(|c| c.is_uniform_across(configured))
    }

    /// Depth-first walk over this node, its children and nested groups
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a DocNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
        for group in self.groups() {
            group.walk(f);
        }
    }

    /// Mutable depth-first walk
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut DocNode)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
        if let Some(groups) = self.groups_mut() {
            for group in groups {
                group.walk_mut(f);
            }
        }
    }

    /// Template context: the serialized node with a `uniform` flag on it and
    /// on every child
    pub fn to_context(&self) -> DocsResult<Value> {
        self.to_context_on(&[])
    }

    /// Template context for a page built for `configured` platforms.
    ///
    /// Nodes that exist on only some of them are not uniform and carry an
    /// `only_on` list of the platforms they do exist on.
    pub fn to_context_on(&self, configured: &[PlatformId]) -> DocsResult<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(ref mut map) = value {
            map.insert("uniform".into(), Value::Bool(self.is_uniform_across(configured)));
            if !self.missing_from(configured).is_empty() {
                map.insert("only_on".into(), serde_json::to_value(&self.platforms)?);
            }
            map.insert(
                "children".into(),
                Value::Array(
                    self.children
                        .iter()
                        .map(|c| c.to_context_on(configured))
                        .collect::<DocsResult<Vec<_>>>()?,
                ),
            );
            if let DocNodeDef::Group { groups, .. } = &self.def {
                map.insert(
                    "groups".into(),
                    Value::Array(
                        groups
                            .iter()
                            .map(|g| g.to_context_on(configured))
                            .collect::<DocsResult<Vec<_>>>()?,
                    ),
                );
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn function(name: &str) -> DocNode {
        DocNode::new(
            DocNodeDef::Member {
                kind: MemberKind::Function,
            },
            name,
            format!("Foundation/#{}", name),
            format!("/docs/c/Foundation/#{}", name),
        )
    }

    fn data(summary: &str) -> PlatformData {
        PlatformData {
            summary: summary.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_platform_is_idempotent() {
        let mut node = function("app_event_loop");
        node.add_platform("aplite", "a1", None);
        node.add_platform("aplite", "a2", None);
        node.add_platform("basalt", "b1", None);

        assert_eq!(node.platforms, vec!["aplite", "basalt"]);
        assert_eq!(node.id, "a1");
        assert_eq!(node.platform_ids["aplite"], "a2");
    }

    #[test]
    fn test_uniform() {
        let mut node = function("app_event_loop");
        node.add_platform("aplite", "a", None);
        node.add_platform("basalt", "b", None);
        node.data.insert("aplite".into(), data("Runs the loop"));
        node.data.insert("basalt".into(), data("Runs the loop"));
        assert!(node.is_uniform());

        node.data.insert("basalt".into(), data("Runs the loop, faster"));
        assert!(!node.is_uniform());
    }

    #[test]
    fn test_uniform_depends_on_children() {
        let mut group = DocNode::new(DocNodeDef::group(), "Foundation", "Foundation/", "/docs/c/Foundation/");
        group.add_platform("aplite", "g", None);
        let mut child = function("f");
        child.add_platform("aplite", "f", None);
        child.add_platform("basalt", "f", None);
        child.data.insert("aplite".into(), data("x"));
        group.children.push(child);
        assert!(!group.is_uniform());
    }

    #[test]
    fn test_preferred_data_uses_newest_platform() {
        let mut node = function("f");
        node.data.insert("aplite".into(), data("old"));
        node.data.insert("basalt".into(), data("new"));
        let order = vec!["aplite".to_string(), "basalt".to_string()];
        assert_eq!(node.summary(&order), "new");
    }

    #[test]
    fn test_context_carries_uniform_flag() {
        let mut node = function("f");
        node.add_platform("aplite", "f", None);
        let ctx = node.to_context().unwrap();
        assert_eq!(ctx["uniform"], Value::Bool(true));
        assert_eq!(ctx["node"], "member");
        assert_eq!(ctx["kind"], "function");
        assert!(ctx.get("only_on").is_none());
    }

    #[test]
    fn test_single_platform_node_is_not_uniform_across_configured() {
        let configured = vec!["aplite".to_string(), "basalt".to_string()];
        let mut group = DocNode::new(DocNodeDef::group(), "Smartstrap", "Smartstrap/", "/docs/c/Smartstrap/");
        group.add_platform("aplite", "g", None);
        group.add_platform("basalt", "g", None);
        let mut child = function("smartstrap_subscribe");
        child.add_platform("basalt", "s", None);
        child.data.insert("basalt".into(), data("Subscribe"));
        group.children.push(child);

        assert!(group.children[0].is_uniform());
        assert!(!group.children[0].is_uniform_across(&configured));
        assert!(!group.is_uniform_across(&configured));
        assert!(group.children[0].is_uniform_across(&[]));

        let ctx = group.to_context_on(&configured).unwrap();
        assert_eq!(ctx["uniform"], Value::Bool(false));
        assert!(ctx.get("only_on").is_none());
        assert_eq!(ctx["children"][0]["uniform"], Value::Bool(false));
        assert_eq!(ctx["children"][0]["only_on"], serde_json::json!(["basalt"]));
    }
}
