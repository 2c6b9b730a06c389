//! Doxygen fragment to HTML transformation
//!
//! A [`DoxygenTransformer`] turns the raw XML fragment stored for one platform
//! of a [`DocNode`](crate::node::DocNode) into [`PlatformData`]. It reads the
//! frozen [`SymbolTable`] to turn `ref` elements into links and never mutates
//! its input; unresolved references degrade to plain text and are reported
//! through the diagnostics collector.

pub mod highlight;

use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::fragment::{Element, Markup};
use crate::node::{MemberKind, ParamDoc, ParamInfo, PlatformData};
use crate::symbols::SymbolTable;
use highlight::highlight_c;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref SITE_HOST: Regex = Regex::new(r"^https?://developer\.pebble\.com/").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Doxygen `simplesect` kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleSectKind {
    Return,
    Note,
    See,
    Warning,
    Attention,
    Since,
    Deprecated,
    Remark,
    Pre,
    Post,
    Invariant,
    Author,
    Version,
    Date,
    Copyright,
}

impl SimpleSectKind {
    /// Admonitions extracted when none are configured
    pub const DEFAULT_ADMONITIONS: [SimpleSectKind; 2] = [SimpleSectKind::Return, SimpleSectKind::Note];

    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleSectKind::Return => "return",
            SimpleSectKind::Note => "note",
            SimpleSectKind::See => "see",
            SimpleSectKind::Warning => "warning",
            SimpleSectKind::Attention => "attention",
            SimpleSectKind::Since => "since",
            SimpleSectKind::Deprecated => "deprecated",
            SimpleSectKind::Remark => "remark",
            SimpleSectKind::Pre => "pre",
            SimpleSectKind::Post => "post",
            SimpleSectKind::Invariant => "invariant",
            SimpleSectKind::Author => "author",
            SimpleSectKind::Version => "version",
            SimpleSectKind::Date => "date",
            SimpleSectKind::Copyright => "copyright",
        }
    }
}

impl FromStr for SimpleSectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "return" => SimpleSectKind::Return,
            "note" => SimpleSectKind::Note,
            "see" => SimpleSectKind::See,
            "warning" => SimpleSectKind::Warning,
            "attention" => SimpleSectKind::Attention,
            "since" => SimpleSectKind::Since,
            "deprecated" => SimpleSectKind::Deprecated,
            "remark" => SimpleSectKind::Remark,
            "pre" => SimpleSectKind::Pre,
            "post" => SimpleSectKind::Post,
            "invariant" => SimpleSectKind::Invariant,
            "author" => SimpleSectKind::Author,
            "version" => SimpleSectKind::Version,
            "date" => SimpleSectKind::Date,
            "copyright" => SimpleSectKind::Copyright,
            other => return Err(format!("unknown simplesect kind: {}", other)),
        })
    }
}

impl fmt::Display for SimpleSectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every transformer of a C source
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    /// `simplesect` kinds lifted out of descriptions
    pub admonitions: Vec<SimpleSectKind>,
    /// Prefix for image urls; the platform name and file name are appended
    pub image_root: String,
    /// Added to Doxygen heading levels
    pub heading_offset: u8,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            admonitions: SimpleSectKind::DEFAULT_ADMONITIONS.to_vec(),
            image_root: "/assets/images/docs/c/".to_string(),
            heading_offset: 0,
        }
    }
}

/// Strip tags and decode entities
pub fn plain_text(html: &str) -> String {
    let stripped = TAG.replace_all(html, "");
    html_escape::decode_html_entities(&stripped).trim().to_string()
}

/// Renders one platform's Doxygen fragments to HTML
pub struct DoxygenTransformer<'a> {
    table: &'a SymbolTable,
    language: &'a str,
    platform: &'a str,
    page: &'a str,
    options: &'a TransformOptions,
}

impl<'a> DoxygenTransformer<'a> {
    pub fn new(
        table: &'a SymbolTable,
        language: &'a str,
        platform: &'a str,
        page: &'a str,
        options: &'a TransformOptions,
    ) -> Self {
        Self {
            table,
            language,
            platform,
            page,
            options,
        }
    }

    /// Data for a group or struct/union `compounddef`
    pub fn compound_data(&self, compound: &Element, diag: &mut DiagnosticsCollector) -> PlatformData {
        self.described(compound, diag)
    }

    /// Data for a `memberdef`
    pub fn member_data(
        &self,
        kind: MemberKind,
        member: &Element,
        diag: &mut DiagnosticsCollector,
    ) -> PlatformData {
        let mut data = self.described(member, diag);
        match kind {
            MemberKind::Typedef => {
                data.type_html = Some(self.inline_html(member.child("type"), diag));
                data.argsstring = Some(member.child_text("argsstring").unwrap_or_default());
            }
            MemberKind::Function => {
                data.type_html = Some(self.inline_html(member.child("type"), diag));
                data.params = self.params(member, diag);
            }
            MemberKind::Define => {
                if let Some(initializer) = member.child("initializer") {
                    data.initializer = Some(self.inline_html(Some(initializer), diag));
                }
                data.type_html = Some(self.inline_html(member.child("type"), diag));
                data.params = self.params(member, diag);
            }
            MemberKind::Variable => {
                data.type_html = Some(self.inline_html(member.child("type"), diag));
            }
            _ => {}
        }
        data.parameters = self.parameter_docs(member, diag);
        data
    }

    /// Data for a struct or union field
    pub fn field_data(&self, field: &Element, diag: &mut DiagnosticsCollector) -> PlatformData {
        let mut data = self.described(field, diag);
        data.type_html = Some(self.inline_html(field.child("type"), diag));
        if let Some(args) = field.child_text("argsstring").filter(|a| !a.is_empty()) {
            data.argsstring = Some(args);
        }
        data
    }

    /// Data for an `enumvalue`
    pub fn enum_value_data(&self, value: &Element, diag: &mut DiagnosticsCollector) -> PlatformData {
        let mut data = self.described(value, diag);
        if let Some(initializer) = value.child("initializer") {
            data.initializer = Some(self.inline_html(Some(initializer), diag));
        }
        data
    }

    /// Summary, description and admonition sections shared by every kind
    fn described(&self, el: &Element, diag: &mut DiagnosticsCollector) -> PlatformData {
        let mut data = PlatformData {
            summary: self.block_html(el.child("briefdescription"), diag),
            ..Default::default()
        };
        let Some(detail) = el.child("detaileddescription") else {
            return data;
        };

        for sect in detail.find_all(|e| e.is("simplesect")) {
            let Some(kind) = sect.attr("kind").and_then(|k| k.parse::<SimpleSectKind>().ok()) else {
                continue;
            };
            if kind == SimpleSectKind::See {
                data.see_also.push(self.see_also(sect, diag));
                continue;
            }
            if !self.options.admonitions.contains(&kind) {
                continue;
            }
            let html = self.block_html(Some(sect), diag);
            match kind {
                SimpleSectKind::Return => data.returns.push(html),
                SimpleSectKind::Note => data.notes.push(html),
                other => data
                    .sections
                    .entry(other.as_str().to_string())
                    .or_default()
                    .push(html),
            }
        }

        data.description = self.block_html(Some(detail), diag);
        data
    }

    fn see_also(&self, sect: &Element, diag: &mut DiagnosticsCollector) -> String {
        let reference = sect
            .children_named("para")
            .find_map(|para| para.child("ref"));
        let resolved = reference
            .and_then(|r| self.table.lookup_id(self.language, r.attr("refid").unwrap_or("")))
            .is_some();
        match reference {
            Some(reference) if resolved => {
                let mut out = String::new();
                self.render_ref(reference, &mut out, diag);
                out
            }
            // unresolved refs render as text, with a warning
            _ => self.block_html(Some(sect), diag),
        }
    }

    fn params(&self, member: &Element, diag: &mut DiagnosticsCollector) -> Vec<ParamInfo> {
        member
            .children_named("param")
            .map(|param| ParamInfo {
                name: param
                    .child_text("defname")
                    .or_else(|| param.child_text("declname"))
                    .unwrap_or_default(),
                type_html: param
                    .child("type")
                    .map(|t| self.inline_html(Some(t), diag))
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn parameter_docs(&self, el: &Element, diag: &mut DiagnosticsCollector) -> Vec<ParamDoc> {
        let Some(list) = el.find(|e| e.is("parameterlist") && e.attr("kind") != Some("retval")) else {
            return Vec::new();
        };
        list.children_named("parameteritem")
            .map(|item| {
                let name_el = item
                    .child("parameternamelist")
                    .and_then(|l| l.child("parametername"));
                let name = name_el.map(Element::text).unwrap_or_default();
                let name = match name_el.and_then(|n| n.attr("direction")).filter(|d| !d.is_empty()) {
                    Some(direction) => format!("{} ({})", name, direction),
                    None => name,
                };
                ParamDoc {
                    name,
                    summary: self.block_html(item.child("parameterdescription"), diag),
                }
            })
            .collect()
    }

    /// Children of `el` rendered as block HTML, trimmed
    pub fn block_html(&self, el: Option<&Element>, diag: &mut DiagnosticsCollector) -> String {
        let Some(el) = el else {
            return String::new();
        };
        let mut out = String::new();
        self.render_children(el, &mut out, diag);
        out.trim().to_string()
    }

    /// Children of `el` rendered inline (types, initializers)
    pub fn inline_html(&self, el: Option<&Element>, diag: &mut DiagnosticsCollector) -> String {
        self.block_html(el, diag)
    }

    fn render_children(&self, el: &Element, out: &mut String, diag: &mut DiagnosticsCollector) {
        for child in &el.children {
            match child {
                Markup::Text(text) => out.push_str(&html_escape::encode_text(text)),
                Markup::Element(e) => self.render_element(e, out, diag),
            }
        }
    }

    fn wrap(&self, tag: &str, el: &Element, out: &mut String, diag: &mut DiagnosticsCollector) {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        self.render_children(el, out, diag);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn render_element(&self, el: &Element, out: &mut String, diag: &mut DiagnosticsCollector) {
        match el.name.as_str() {
            "para" => {
                let mut inner = String::new();
                self.render_children(el, &mut inner, diag);
                if !inner.trim().is_empty() {
                    out.push_str("<p>");
                    out.push_str(inner.trim());
                    out.push_str("</p>");
                }
            }
            "ref" => self.render_ref(el, out, diag),
            "programlisting" => out.push_str(&highlight_c(code_text(el).trim())),
            "simplesect" | "parameterlist" | "anchor" => {}
            "heading" => {
                let level = el
                    .attr("level")
                    .and_then(|l| l.parse::<u8>().ok())
                    .unwrap_or(1)
                    .saturating_add(self.options.heading_offset)
                    .clamp(1, 6);
                self.wrap(&format!("h{}", level), el, out, diag);
            }
            "htmlonly" => out.push_str(&html_escape::decode_html_entities(&el.text())),
            "itemizedlist" => self.wrap("ul", el, out, diag),
            "orderedlist" => self.wrap("ol", el, out, diag),
            "listitem" => self.wrap("li", el, out, diag),
            "computeroutput" => self.wrap("code", el, out, diag),
            "emphasis" => self.wrap("em", el, out, diag),
            "bold" => self.wrap("strong", el, out, diag),
            "preformatted" | "verbatim" => self.wrap("pre", el, out, diag),
            "linebreak" => out.push_str("<br>"),
            "ndash" => out.push('-'),
            "mdash" => out.push('\u{2014}'),
            "sp" => out.push(' '),
            "ulink" => {
                let url = el.attr("url").unwrap_or("");
                let href = SITE_HOST.replace(url, "/");
                out.push_str("<a href=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(&href));
                out.push_str("\">");
                self.render_children(el, out, diag);
                out.push_str("</a>");
            }
            "image" => {
                if el.attr("type").map_or(true, |t| t == "html") {
                    let src = format!(
                        "{}{}/{}",
                        self.options.image_root,
                        self.platform,
                        el.attr("name").unwrap_or("")
                    );
                    out.push_str("<img src=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(&src));
                    out.push_str("\">");
                }
            }
            "table" => self.wrap("table", el, out, diag),
            "row" => self.wrap("tr", el, out, diag),
            "entry" => {
                let tag = if el.attr("thead") == Some("yes") { "th" } else { "td" };
                self.wrap(tag, el, out, diag);
            }
            _ => self.render_children(el, out, diag),
        }
    }

    fn render_ref(&self, el: &Element, out: &mut String, diag: &mut DiagnosticsCollector) {
        let text = html_escape::encode_text(&el.text()).into_owned();
        let refid = el.attr("refid").unwrap_or("");
        match self.table.lookup_id(self.language, refid) {
            Some(url) => {
                out.push_str("<a href=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(url));
                out.push_str("\">");
                out.push_str(&text);
                out.push_str("</a>");
            }
            None => {
                diag.add(
                    Diagnostic::warning(format!("unresolved reference {}", refid))
                        .on_page(self.page)
                        .for_symbol(el.text())
                        .with_code("unresolved-ref"),
                );
                out.push_str(&text);
            }
        }
    }
}

/// Source text of a `programlisting`, one line per `codeline`
fn code_text(listing: &Element) -> String {
    fn collect(el: &Element, out: &mut String) {
        for child in &el.children {
            match child {
                Markup::Text(t) => out.push_str(t),
                Markup::Element(e) if e.is("sp") => out.push(' '),
                Markup::Element(e) => collect(e, out),
            }
        }
    }
    let lines: Vec<String> = listing
        .children_named("codeline")
        .map(|line| {
            let mut text = String::new();
            collect(line, &mut text);
            text
        })
        .collect();
    if lines.is_empty() {
        let mut text = String::new();
        collect(listing, &mut text);
        return text;
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::parse_xml;
    use crate::language::LanguagePriority;
    use crate::symbols::IdMapping;
    use pretty_assertions::assert_eq;

    fn table() -> SymbolTable {
        let mut diagnostics = DiagnosticsCollector::new();
        let mut builder = SymbolTable::builder(LanguagePriority::default());
        builder.add_ids(
            "c",
            [IdMapping::new(
                "group___window_1ga",
                "/docs/c/User_Interface/Window/#window_create",
            )],
            &mut diagnostics,
        );
        builder.build()
    }

    fn member(xml: &str) -> Element {
        let doc = parse_xml("test.xml", xml).unwrap();
        doc.find_named("memberdef").cloned().unwrap()
    }

    #[test]
    fn test_function_member() {
        let xml = r#"<memberdef kind="function" id="f">
  <type><ref refid="group___window_1ga">Window</ref> *</type>
  <name>window_create</name>
  <param><type>void</type><declname>ctx</declname></param>
  <briefdescription><para>Creates a new <computeroutput>Window</computeroutput>.</para></briefdescription>
  <detaileddescription>
    <para>Call <ref refid="missing_1">window_destroy</ref> when done.
      <simplesect kind="return"><para>A pointer to the window.</para></simplesect>
      <simplesect kind="note"><para>Heap allocated.</para></simplesect>
      <simplesect kind="see"><para><ref refid="group___window_1ga">window_create</ref></para></simplesect>
      <simplesect kind="warning"><para>Ignored by default.</para></simplesect>
      <parameterlist kind="param"><parameteritem>
        <parameternamelist><parametername direction="in">ctx</parametername></parameternamelist>
        <parameterdescription><para>Context.</para></parameterdescription>
      </parameteritem></parameterlist>
    </para>
  </detaileddescription>
  <location file="window.h" line="42"/>
</memberdef>"#;
        let options = TransformOptions::default();
        let table = table();
        let transformer = DoxygenTransformer::new(&table, "c", "basalt", "/docs/c/User_Interface/Window/", &options);
        let mut diag = DiagnosticsCollector::new();
        let data = transformer.member_data(MemberKind::Function, &member(xml), &mut diag);

        assert_eq!(data.summary, "<p>Creates a new <code>Window</code>.</p>");
        assert_eq!(
            data.type_html.as_deref(),
            Some("<a href=\"/docs/c/User_Interface/Window/#window_create\">Window</a> *")
        );
        assert_eq!(data.params, vec![ParamInfo { name: "ctx".into(), type_html: "void".into() }]);
        assert_eq!(data.parameters, vec![ParamDoc { name: "ctx (in)".into(), summary: "<p>Context.</p>".into() }]);
        assert_eq!(data.returns, vec!["<p>A pointer to the window.</p>"]);
        assert_eq!(data.notes, vec!["<p>Heap allocated.</p>"]);
        assert_eq!(
            data.see_also,
            vec!["<a href=\"/docs/c/User_Interface/Window/#window_create\">window_create</a>"]
        );
        assert!(data.sections.is_empty());
        assert!(data.description.starts_with("<p>Call window_destroy when done."));
        assert!(!data.description.contains("pointer to the window"));

        let unresolved: Vec<_> = diag.with_code("unresolved-ref").collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].symbol.as_deref(), Some("window_destroy"));
    }

    #[test]
    fn test_configured_admonitions() {
        let xml = r#"<memberdef kind="enum" id="e"><name>E</name>
  <briefdescription/>
  <detaileddescription><para><simplesect kind="warning"><para>Careful.</para></simplesect></para></detaileddescription>
</memberdef>"#;
        let options = TransformOptions {
            admonitions: vec![SimpleSectKind::Warning],
            ..Default::default()
        };
        let table = table();
        let transformer = DoxygenTransformer::new(&table, "c", "aplite", "/p/", &options);
        let data = transformer.member_data(MemberKind::Enum, &member(xml), &mut DiagnosticsCollector::new());
        assert_eq!(data.sections["warning"], vec!["<p>Careful.</p>"]);
        assert_eq!(data.description, "");
    }

    #[test]
    fn test_inline_elements() {
        let xml = r#"<memberdef kind="define" id="d"><name>D</name>
  <briefdescription><para>See <ulink url="https://developer.pebble.com/guides/">guides</ulink><ndash/>now<linebreak/></para></briefdescription>
  <detaileddescription>
    <para><heading level="2">Usage</heading></para>
    <para><image type="html" name="shot.png"/><image type="latex" name="shot.eps"/></para>
    <para><htmlonly>&lt;div class="x"&gt;raw&lt;/div&gt;</htmlonly></para>
    <para><programlisting><codeline><highlight class="normal">int<sp/>x;</highlight></codeline></programlisting></para>
  </detaileddescription>
</memberdef>"#;
        let options = TransformOptions {
            heading_offset: 1,
            ..Default::default()
        };
        let table = table();
        let transformer = DoxygenTransformer::new(&table, "c", "chalk", "/p/", &options);
        let data = transformer.member_data(MemberKind::Define, &member(xml), &mut DiagnosticsCollector::new());

        assert_eq!(data.summary, "<p>See <a href=\"/guides/\">guides</a>-now<br></p>");
        assert!(data.description.contains("<h3>Usage</h3>"));
        assert!(data.description.contains("<img src=\"/assets/images/docs/c/chalk/shot.png\">"));
        assert!(!data.description.contains("shot.eps"));
        assert!(data.description.contains("<div class=\"x\">raw</div>"));
        assert!(data.description.contains("<div class=\"highlight\">"));
        assert!(data.description.contains("<span class=\"kt\">int</span> <span class=\"n\">x</span>"));
    }

    #[test]
    fn test_heading_levels_clamp_at_h6() {
        let xml = r#"<memberdef kind="define" id="d"><name>D</name>
  <briefdescription/>
  <detaileddescription>
    <para><heading level="2">Usage</heading></para>
    <para><heading level="5">Details</heading></para>
  </detaileddescription>
</memberdef>"#;
        let options = TransformOptions {
            heading_offset: 3,
            ..Default::default()
        };
        let table = table();
        let transformer = DoxygenTransformer::new(&table, "c", "basalt", "/p/", &options);
        let data = transformer.member_data(MemberKind::Define, &member(xml), &mut DiagnosticsCollector::new());

        assert!(data.description.contains("<h5>Usage</h5>"));
        assert!(data.description.contains("<h6>Details</h6>"));
    }

    #[test]
    fn test_unresolved_see_falls_back_to_text() {
        let xml = r#"<memberdef kind="function" id="f"><name>window_stack_push</name>
  <briefdescription/>
  <detaileddescription>
    <para><simplesect kind="see"><para><ref refid="missing_1">window_destroy</ref></para></simplesect></para>
  </detaileddescription>
</memberdef>"#;
        let options = TransformOptions::default();
        let table = table();
        let transformer = DoxygenTransformer::new(&table, "c", "basalt", "/p/", &options);
        let mut diag = DiagnosticsCollector::new();
        let data = transformer.member_data(MemberKind::Function, &member(xml), &mut diag);

        assert_eq!(data.see_also, vec!["<p>window_destroy</p>"]);
        let unresolved: Vec<_> = diag.with_code("unresolved-ref").collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].symbol.as_deref(), Some("window_destroy"));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("<p>A &amp; <code>B</code></p>"), "A & B");
    }
}
