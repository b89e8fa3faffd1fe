// tests/inject_properties.rs

use std::collections::BTreeSet;
use std::path::Path;

use assetpipe::stages::{InjectionManifest, inject_markup};
use proptest::prelude::*;

const PAGE: &str = "<html>\n<head>\n  <!-- inject:css -->\n  <!-- endinject -->\n</head>\n<body>\n  <!-- inject:js -->\n  <!-- endinject -->\n</body>\n</html>\n";

fn asset_names() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set(
        ("(css|js|vendor/js)", "[a-z][a-z0-9_-]{0,8}", prop_oneof!["css", "js", "map", "png"])
            .prop_map(|(dir, stem, ext)| format!("{dir}/{stem}.{ext}")),
        0..12,
    )
}

proptest! {
    #[test]
    fn every_asset_is_referenced_exactly_once_in_lexical_order(names in asset_names()) {
        let root = Path::new("/site");
        // Feed the paths in reverse to make sure ordering does not depend on input order.
        let manifest = InjectionManifest::from_paths(root, names.iter().rev().map(|n| root.join(n)));
        let html = inject_markup(PAGE, &manifest).unwrap();

        let expected_css: Vec<&String> = names.iter().filter(|n| n.ends_with(".css")).collect();
        let expected_js: Vec<&String> = names.iter().filter(|n| n.ends_with(".js")).collect();
        prop_assert_eq!(manifest.len(), expected_css.len() + expected_js.len());

        let mut last = 0usize;
        for name in expected_css.iter().chain(expected_js.iter()) {
            let needle = if name.ends_with(".css") {
                format!("href=\"{name}\"")
            } else {
                format!("src=\"{name}\"")
            };
            prop_assert_eq!(html.matches(&needle).count(), 1, "{} in {}", needle, html);
            let pos = html.find(&needle).unwrap();
            prop_assert!(pos >= last, "{} out of order in {}", name, html);
            last = pos;
        }

        for name in names.iter().filter(|n| n.ends_with(".map") || n.ends_with(".png")) {
            prop_assert!(!html.contains(name.as_str()));
        }
    }

    #[test]
    fn injecting_twice_is_a_no_op(names in asset_names()) {
        let root = Path::new("/site");
        let manifest = InjectionManifest::from_paths(root, names.iter().map(|n| root.join(n)));

        let once = inject_markup(PAGE, &manifest).unwrap();
        let twice = inject_markup(&once, &manifest).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn reinjection_replaces_previous_references(
        before in asset_names(),
        after in asset_names(),
    ) {
        let root = Path::new("/site");
        let first = InjectionManifest::from_paths(root, before.iter().map(|n| root.join(n)));
        let second = InjectionManifest::from_paths(root, after.iter().map(|n| root.join(n)));

        let stale = inject_markup(PAGE, &first).unwrap();
        let fresh = inject_markup(PAGE, &second).unwrap();
        prop_assert_eq!(inject_markup(&stale, &second).unwrap(), fresh);
    }
}

#[test]
fn pages_without_markers_gain_them_once() {
    let manifest = InjectionManifest {
        styles: vec!["css/a.css".to_string()],
        scripts: vec!["js/main.js".to_string()],
    };
    let page = "<html><head></head><body></body></html>";

    let once = inject_markup(page, &manifest).unwrap();
    let twice = inject_markup(&once, &manifest).unwrap();

    assert_eq!(once, twice);
    assert_eq!(once.matches("<!-- inject:css -->").count(), 1);
    assert_eq!(once.matches("<!-- inject:js -->").count(), 1);
}
