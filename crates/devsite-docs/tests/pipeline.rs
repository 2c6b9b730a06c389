//! End-to-end runs over every source format

use devsite_docs::config::CSourceConfig;
use devsite_docs::merge::merge_children;
use devsite_docs::output::{find_clashes, missing_pages};
use devsite_docs::test::{
    mock_appledoc_archive, mock_doxygen_archive, mock_doxygen_archive_without, mock_javadoc_archive,
    mock_js_modules, mock_pebblekit_js_modules,
};
use devsite_docs::{
    AdapterId, Archive, DiagnosticsCollector, DocsGenerator, DocsOutput, DocumentationAndroid, DocumentationC,
    DocumentationIos, DocumentationJs, DocumentationSource, HtmlSourceConfig, Page, PageContent, ProseOptions,
    ProseRenderer,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

const PLATFORMS: [&str; 2] = ["aplite", "basalt"];

fn html_config() -> HtmlSourceConfig {
    HtmlSourceConfig {
        archive: "unused".into(),
        url_root: None,
    }
}

fn run_with(c_archive: Archive) -> DocsOutput {
    let c = DocumentationC::with_archive(AdapterId::C, CSourceConfig::new("unused"), c_archive).unwrap();
    let rocky =
        DocumentationJs::from_json(AdapterId::RockyJs, mock_js_modules(), true, ProseOptions::default()).unwrap();
    let pkjs = DocumentationJs::from_json(
        AdapterId::PebbleKitJs,
        mock_pebblekit_js_modules(),
        false,
        ProseOptions::default(),
    )
    .unwrap();
    let android = DocumentationAndroid::with_archive(html_config(), mock_javadoc_archive());
    let ios = DocumentationIos::with_archive(html_config(), mock_appledoc_archive());

    DocsGenerator::new()
        .with_source(Box::new(ios))
        .with_source(Box::new(pkjs))
        .with_source(Box::new(android))
        .with_source(Box::new(rocky))
        .with_source(Box::new(c))
        .run()
        .unwrap()
}

fn full_run() -> DocsOutput {
    run_with(mock_doxygen_archive(&PLATFORMS))
}

fn page_for<'a>(output: &'a DocsOutput, url: &str) -> Option<&'a Page> {
    let path = url.split('#').next().unwrap_or("");
    let path = urlencoding::decode(path).unwrap().into_owned();
    [path.clone(), format!("{}index.html", path), format!("{}/", path)]
        .iter()
        .find_map(|candidate| output.page(candidate))
}

fn count(output: &DocsOutput, code: &str) -> usize {
    output
        .diagnostics
        .iter()
        .filter(|d| d.code.as_deref() == Some(code))
        .count()
}

#[test]
fn no_duplicate_symbols() {
    let output = full_run();
    assert!(find_clashes(&output.symbols).is_empty());
    let unique: HashSet<(&str, &str)> = output
        .symbols
        .iter()
        .map(|s| (s.name.as_str(), s.url.as_str()))
        .collect();
    assert_eq!(unique.len(), output.symbols.len());
    assert_eq!(count(&output, "symbol-clash"), 0);
}

#[test]
fn every_symbol_has_a_page() {
    let output = full_run();
    assert!(missing_pages(&output.symbols, &output.pages).is_empty());
    assert_eq!(count(&output, "missing-page"), 0);
}

#[test]
fn every_tree_is_well_formed() {
    let output = full_run();
    assert_eq!(
        output.tree.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["c", "rockyjs", "pebblekit_js", "pebblekit_android", "pebblekit_ios"]
    );
    for branches in output.tree.values() {
        assert!(!branches.is_empty());
        for branch in branches {
            assert!(branch.validate().is_empty(), "{:?}", branch.validate());
        }
    }
}

#[test]
fn symbols_carry_the_language_of_their_page() {
    let output = full_run();
    for symbol in &output.symbols {
        assert!(AdapterId::from_language(&symbol.language).is_some());
        let page = page_for(&output, &symbol.url).unwrap();
        assert_eq!(page.language, symbol.language, "{}", symbol.name);
    }
}

#[test]
fn merging_a_forest_with_itself_changes_nothing() {
    let mut source = DocumentationC::with_archive(
        AdapterId::C,
        CSourceConfig::new("unused"),
        mock_doxygen_archive(&PLATFORMS),
    )
    .unwrap();
    let mut diag = DiagnosticsCollector::new();
    source.parse(&mut diag).unwrap();

    let original = source.groups().to_vec();
    let mut merged = original.clone();
    merge_children(&mut merged, original.clone());
    assert_eq!(merged, original);
}

#[test]
fn bare_names_prefer_the_c_reference() {
    let output = full_run();
    let window = output.table.lookup("Window", None).unwrap();
    assert_eq!(window.language, "c");
    assert_eq!(window.url, "/docs/c/User_Interface/Window/");

    let rocky = output.page("/docs/rockyjs/rocky/").unwrap();
    let context = rocky.context().unwrap();
    let on = &context["js_module"]["children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["name"] == "on")
        .unwrap()["data"]["any"]["description"];
    assert!(on.as_str().unwrap().contains("href=\"/docs/c/User_Interface/Window/\""));

    let pebble = output.page("/docs/pebblekit-js/Pebble/").unwrap();
    let PageContent::JsModule { module, .. } = &pebble.content else {
        panic!("expected a module page");
    };
    assert!(module.data["any"]
        .description
        .contains("href=\"/docs/pebblekit-js/Pebble/#Window\""));
}

#[test]
fn unknown_references_degrade_to_text() {
    let output = full_run();
    let renderer = ProseRenderer::new(&output.table, ProseOptions::default());
    let mut diag = DiagnosticsCollector::new();

    assert_eq!(
        renderer.render("Use ``NotASymbol`` here.", "/guides/", &mut diag).trim(),
        "<p>Use <code>NotASymbol</code> here.</p>"
    );
    assert_eq!(
        renderer.render("[Title](``DoesNotExist``)", "/guides/", &mut diag).trim(),
        "<p>Title</p>"
    );
    assert_eq!(diag.with_code("unresolved-backtick").count(), 2);
}

#[test]
fn platform_differences_stay_retrievable() {
    let output = full_run();
    let page = output.page("/docs/c/Graphics/").unwrap();
    let PageContent::CGroup { group, .. } = &page.content else {
        panic!("expected a C group page");
    };
    let draw = group
        .children
        .iter()
        .find(|c| c.name == "graphics_draw_rect")
        .unwrap();

    assert!(!draw.is_uniform());
    assert_eq!(draw.platforms, vec!["aplite", "basalt"]);
    let aplite = &draw.data["aplite"].parameters[0].summary;
    let basalt = &draw.data["basalt"].parameters[0].summary;
    assert!(aplite.contains("aplite framebuffer"));
    assert!(basalt.contains("basalt framebuffer"));

    let context = page.context().unwrap();
    let function = &context["group"]["by_kind"]["function"][0];
    assert_eq!(function["uniform"], false);
    assert!(function["data"]["aplite"].is_object());
    assert!(function["data"]["basalt"].is_object());

    let foundation = output.page("/docs/c/Foundation/App/").unwrap();
    let PageContent::CGroup { group, .. } = &foundation.content else {
        panic!("expected a C group page");
    };
    assert!(group.children.iter().all(|c| c.is_uniform()));
}

#[test]
fn group_missing_on_a_platform_still_renders() {
    let output = run_with(mock_doxygen_archive_without(&PLATFORMS, "aplite", "smartstrap"));
    let page = output.page("/docs/c/Smartstrap/").unwrap();
    let PageContent::CGroup { group, .. } = &page.content else {
        panic!("expected a C group page");
    };
    assert_eq!(group.children_on("aplite").count(), 0);
    assert_eq!(group.children_on("basalt").count(), 1);

    let context = page.context().unwrap();
    assert_eq!(context["group"]["name"], "Smartstrap");
    assert_eq!(context["group"]["uniform"], false);
    let subscribe = &context["group"]["by_kind"]["function"][0];
    assert_eq!(subscribe["name"], "smartstrap_subscribe");
    assert_eq!(subscribe["uniform"], false);
    assert_eq!(subscribe["only_on"], serde_json::json!(["basalt"]));
    assert_eq!(count(&output, "platform-placeholder"), 1);
}

#[test]
fn output_is_written_as_json() {
    let output = full_run();
    let dir = tempfile::tempdir().unwrap();
    output.write_json(dir.path()).unwrap();
    for file in ["symbols.json", "pages.json", "tree.json", "redirects.json"] {
        let text = std::fs::read_to_string(dir.path().join(file)).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok(), "{}", file);
    }
}
