//! Reading one platform's Doxygen XML into a forest of nodes

use crate::archive::Archive;
use crate::diagnostics::{DocsError, DocsResult};
use crate::fragment::{parse_xml, Element};
use crate::merge::merge_children;
use crate::node::{ClassKind, DocNode, DocNodeDef, MemberKind};
use crate::slug::menu_path;
use indexmap::IndexMap;

/// Elements removed from a group to turn it into an empty placeholder
pub const PLACEHOLDER_STRIPPED: [&str; 4] = ["memberdef", "innerclass", "sectiondef", "innergroup"];

/// Archive path of a Doxygen file for a platform, if present.
///
/// Archives built by the SDK nest everything under `doxygen_sdk/`.
pub fn entry_path(archive: &Archive, platform: &str, file: &str) -> Option<String> {
    [
        format!("{}/xml/{}", platform, file),
        format!("doxygen_sdk/{}/xml/{}", platform, file),
    ]
    .into_iter()
    .find(|path| archive.contains(path))
}

/// The `compounddef` of a Doxygen file
pub fn load_compound(archive: &Archive, platform: &str, file: &str) -> DocsResult<Element> {
    let path = entry_path(archive, platform, file)
        .ok_or_else(|| DocsError::missing_entry(archive.name(), format!("{}/xml/{}", platform, file)))?;
    let document = parse_xml(&path, &archive.read_to_string(&path)?)?;
    document
        .find_named("compounddef")
        .cloned()
        .ok_or_else(|| DocsError::parse(path, "no compounddef element"))
}

/// Copy of a group with all of its content removed
pub fn placeholder_shell(compound: &Element) -> Element {
    compound.without(|e| PLACEHOLDER_STRIPPED.contains(&e.name.as_str()))
}

fn line_of(el: &Element) -> usize {
    el.child("location")
        .and_then(|l| l.attr("line"))
        .and_then(|l| l.parse().ok())
        .unwrap_or(0)
}

/// Builds the node forest of a single platform
pub struct DoxygenReader<'a> {
    archive: &'a Archive,
    platform: &'a str,
    url_root: &'a str,
    /// Stand-in compounds for groups this platform lacks, by group id
    placeholders: &'a IndexMap<String, Element>,
}

impl<'a> DoxygenReader<'a> {
    pub fn new(
        archive: &'a Archive,
        platform: &'a str,
        url_root: &'a str,
        placeholders: &'a IndexMap<String, Element>,
    ) -> Self {
        Self {
            archive,
            platform,
            url_root,
            placeholders,
        }
    }

    /// Read the top-level groups, in the given order
    pub fn read_groups(&self, ids: &[String]) -> DocsResult<Vec<DocNode>> {
        let mut groups = Vec::new();
        for id in ids {
            let group = self.read_group(id, &[])?;
            merge_children(&mut groups, vec![group]);
        }
        Ok(groups)
    }

    fn read_group(&self, id: &str, parent_menu: &[String]) -> DocsResult<DocNode> {
        let (compound, placeholder) = match self.placeholders.get(id) {
            Some(shell) => (shell.clone(), true),
            None => (
                load_compound(self.archive, self.platform, &format!("group___{}.xml", id))?,
                false,
            ),
        };

        let name = compound
            .child_text("title")
            .or_else(|| compound.child_text("compoundname"))
            .unwrap_or_else(|| id.to_string());
        let mut menu = parent_menu.to_vec();
        menu.push(name.clone());
        let path = menu_path(&menu);
        let url = format!("{}{}", self.url_root, path);

        let mut group = DocNode::new(DocNodeDef::group(), name, path.clone(), url);
        if placeholder {
            if let DocNodeDef::Group { placeholders, .. } = &mut group.def {
                placeholders.push(self.platform.to_string());
            }
        }

        let mut subgroups = Vec::new();
        for inner in compound.children_named("innergroup") {
            let Some(refid) = inner.attr("refid") else { continue };
            let sub_id = refid.trim_start_matches("group___");
            let subgroup = self.read_group(sub_id, &menu)?;
            merge_children(&mut subgroups, vec![subgroup]);
        }
        if let Some(groups) = group.groups_mut() {
            *groups = subgroups;
        }

        let mut children = Vec::new();
        for memberdef in compound.find_all(|e| e.is("memberdef")) {
            if let Some(member) = self.read_member(memberdef, &path) {
                merge_children(&mut children, vec![member]);
            }
        }
        for inner in compound.children_named("innerclass") {
            if let Some(class) = self.read_class(inner, &path)? {
                merge_children(&mut children, vec![class]);
            }
        }
        group.children = children;

        let raw_id = compound.attr("id").unwrap_or(id).to_string();
        let raw = compound.without(|e| e.is("sectiondef") || e.is("innergroup") || e.is("innerclass"));
        group.add_platform(self.platform, raw_id, Some(raw));
        Ok(group)
    }

    fn read_member(&self, memberdef: &Element, group_path: &str) -> Option<DocNode> {
        let kind = MemberKind::from_doxygen(memberdef.attr("kind")?)?;
        let name = memberdef.child_text("name")?;
        let path = format!("{}#{}", group_path, name);
        let url = format!("{}{}", self.url_root, path);

        let mut member = DocNode::new(DocNodeDef::Member { kind }, name, path, url)
            .at_position(line_of(memberdef));

        if kind == MemberKind::Enum {
            let mut values = Vec::new();
            for (i, value) in memberdef.children_named("enumvalue").enumerate() {
                let Some(value_name) = value.child_text("name") else { continue };
                let value_path = format!("{}#{}", group_path, value_name);
                let value_url = format!("{}{}", self.url_root, value_path);
                let mut node = DocNode::new(DocNodeDef::EnumValue, value_name, value_path, value_url)
                    .at_position(i);
                node.add_platform(
                    self.platform,
                    value.attr("id").unwrap_or_default(),
                    Some(value.clone()),
                );
                merge_children(&mut values, vec![node]);
            }
            member.children = values;
        }

        member.add_platform(
            self.platform,
            memberdef.attr("id").unwrap_or_default(),
            Some(memberdef.without(|e| e.is("enumvalue"))),
        );
        Some(member)
    }

    fn read_class(&self, inner: &Element, group_path: &str) -> DocsResult<Option<DocNode>> {
        let label = inner.text();
        if label.contains("__unnamed__") || label.contains('.') {
            return Ok(None);
        }
        let Some(refid) = inner.attr("refid") else {
            return Ok(None);
        };
        let kind = if refid.starts_with("struct_") {
            ClassKind::Struct
        } else if refid.starts_with("union_") {
            ClassKind::Union
        } else {
            return Ok(None);
        };

        let compound = load_compound(self.archive, self.platform, &format!("{}.xml", refid))?;
        let name = compound.child_text("compoundname").unwrap_or(label);
        let path = format!("{}#{}", group_path, name);
        let url = format!("{}{}", self.url_root, path);
        let mut class = DocNode::new(DocNodeDef::Class { kind }, name, path, url)
            .at_position(line_of(&compound));

        let mut fields = Vec::new();
        for memberdef in compound.find_all(|e| e.is("memberdef")) {
            let Some(field_name) = memberdef.child_text("name") else { continue };
            if field_name.starts_with('@') {
                continue;
            }
            let field_path = format!("{}#{}", group_path, field_name);
            let field_url = format!("{}{}", self.url_root, field_path);
            let mut field = DocNode::new(DocNodeDef::Field, field_name, field_path, field_url)
                .at_position(line_of(memberdef));
            field.add_platform(
                self.platform,
                memberdef.attr("id").unwrap_or_default(),
                Some(memberdef.clone()),
            );
            merge_children(&mut fields, vec![field]);
        }
        class.children = fields;

        let raw = compound.without(|e| e.is("sectiondef"));
        class.add_platform(self.platform, compound.attr("id").unwrap_or(refid), Some(raw));
        Ok(Some(class))
    }
}
