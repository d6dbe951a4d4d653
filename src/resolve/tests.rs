use super::core::ResourceFactory;
use super::error::{FactoryError, RoutingFailure};
use super::method::{select_method, MethodOutcome};
use super::root::select_root;
use super::walker::walk;
use crate::media::{AcceptList, MediaType};
use crate::pattern::{RemainingPath, VarVec};
use crate::registry::{CandidateRegistry, MethodDescriptor, ResourceClass};
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Test factory: objects are strings describing the construction, locator
/// targets are looked up by locator name.
struct MapFactory {
    targets: HashMap<&'static str, Arc<ResourceClass>>,
    fail_locators: Vec<&'static str>,
}

impl MapFactory {
    fn new() -> MapFactory {
        MapFactory {
            targets: HashMap::new(),
            fail_locators: Vec::new(),
        }
    }

    fn with_target(mut self, locator: &'static str, class: Arc<ResourceClass>) -> MapFactory {
        self.targets.insert(locator, class);
        self
    }
}

impl ResourceFactory for MapFactory {
    type Object = String;

    fn instantiate_root(
        &self,
        class: &Arc<ResourceClass>,
        _vars: &VarVec,
    ) -> Result<String, FactoryError> {
        Ok(class.key().to_string())
    }

    fn locate(
        &self,
        locator: &Arc<MethodDescriptor>,
        parent: &String,
        vars: &VarVec,
    ) -> Result<(String, Arc<ResourceClass>), FactoryError> {
        if self.fail_locators.contains(&locator.name()) {
            return Err("locator blew up".into());
        }
        let class = self
            .targets
            .get(locator.name())
            .ok_or_else(|| format!("no target for locator {}", locator.name()))?;
        let id = vars
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Ok((format!("{parent}/{}[{id}]", class.key()), Arc::clone(class)))
    }
}

fn snapshot_of(classes: Vec<Arc<ResourceClass>>) -> Arc<crate::registry::RegistrySnapshot> {
    let registry = CandidateRegistry::new();
    for class in classes {
        registry.attach(class).expect("attach should succeed");
    }
    registry.snapshot()
}

fn rp(path: &str) -> RemainingPath {
    RemainingPath::new(path)
}

// --- root selection -------------------------------------------------------

#[test]
fn test_root_prefers_more_literal_characters() {
    let templated = ResourceClass::builder("Templated", "/a/{x}")
        .method("get_templated", Method::GET, "")
        .build()
        .expect("should build");
    let fixed = ResourceClass::builder("Fixed", "/a/fixed")
        .method("get_fixed", Method::GET, "")
        .build()
        .expect("should build");
    let snapshot = snapshot_of(vec![templated, fixed]);

    let selection = select_root(&snapshot, &rp("/a/fixed")).expect("should select");
    assert_eq!(selection.class.key().as_str(), "Fixed");
}

#[test]
fn test_root_not_found() {
    let snapshot = snapshot_of(vec![ResourceClass::builder("Widgets", "/widgets")
        .method("list", Method::GET, "")
        .build()
        .expect("should build")]);
    assert!(matches!(
        select_root(&snapshot, &rp("/gadgets")),
        Err(RoutingFailure::RootResourceNotFound { .. })
    ));
}

#[test]
fn test_root_without_sub_resources_cannot_take_extra_path() {
    let flat = ResourceClass::builder("Flat", "/flat")
        .method("get_flat", Method::GET, "")
        .build()
        .expect("should build");
    let snapshot = snapshot_of(vec![flat]);
    // "/flat" itself resolves, "/flat/more" cannot be consumed
    assert!(select_root(&snapshot, &rp("/flat")).is_ok());
    assert!(matches!(
        select_root(&snapshot, &rp("/flat/more")),
        Err(RoutingFailure::RootResourceNotFound { .. })
    ));
}

#[test]
fn test_root_specificity_tie_is_ambiguous() {
    // both match "/a/a" with two literal characters and one variable
    let left = ResourceClass::builder("Left", "/{p}/a")
        .method("get_left", Method::GET, "")
        .build()
        .expect("should build");
    let right = ResourceClass::builder("Right", "/a/{q}")
        .method("get_right", Method::GET, "")
        .build()
        .expect("should build");
    let snapshot = snapshot_of(vec![left, right]);
    assert!(matches!(
        select_root(&snapshot, &rp("/a/a")),
        Err(RoutingFailure::AmbiguousRootResource { .. })
    ));
}

// --- sub-resource walk ----------------------------------------------------

fn parts_class() -> Arc<ResourceClass> {
    ResourceClass::sub_resource("Parts")
        .method("get_part", Method::GET, "/{part_id}")
        .build()
        .expect("Parts should build")
}

fn widgets_with_locator() -> Arc<ResourceClass> {
    ResourceClass::builder("Widgets", "/widgets")
        .method("list_widgets", Method::GET, "")
        .method("get_widget", Method::GET, "/{id}")
        .locator("widget_parts", "/{id}/parts")
        .build()
        .expect("Widgets should build")
}

#[test]
fn test_walk_terminates_on_empty_remainder() {
    let widgets = widgets_with_locator();
    let snapshot = snapshot_of(vec![Arc::clone(&widgets)]);
    let factory = MapFactory::new();
    let selection = select_root(&snapshot, &rp("/widgets")).expect("should select");
    let terminal = walk(&factory, selection).expect("walk should finish");
    assert_eq!(terminal.object, "Widgets");
    assert!(terminal.remainder.is_empty_or_slash());
}

#[test]
fn test_walk_through_locator() {
    let widgets = widgets_with_locator();
    let snapshot = snapshot_of(vec![Arc::clone(&widgets)]);
    let factory = MapFactory::new().with_target("widget_parts", parts_class());
    let selection = select_root(&snapshot, &rp("/widgets/42/parts/7")).expect("should select");
    let terminal = walk(&factory, selection).expect("walk should finish");
    assert_eq!(terminal.object, "Widgets/Parts[42]");
    assert_eq!(terminal.class.key().as_str(), "Parts");
    assert_eq!(terminal.remainder.as_str(), "7");
    // the locator hop recorded its variable
    assert_eq!(terminal.vars.len(), 1);
    assert_eq!(terminal.vars[0].1, "42");
}

#[test]
fn test_walk_dead_end() {
    let widgets = widgets_with_locator();
    let snapshot = snapshot_of(vec![Arc::clone(&widgets)]);
    let factory = MapFactory::new().with_target("widget_parts", parts_class());
    let selection =
        select_root(&snapshot, &rp("/widgets/42/parts/7/bolts")).expect("should select");
    // Parts has nothing matching "7/bolts"
    let err = walk(&factory, selection).expect_err("must dead-end");
    assert!(matches!(err, RoutingFailure::ResourceNotFound { .. }));
}

#[test]
fn test_walk_wraps_locator_failure() {
    let widgets = widgets_with_locator();
    let snapshot = snapshot_of(vec![Arc::clone(&widgets)]);
    let mut factory = MapFactory::new().with_target("widget_parts", parts_class());
    factory.fail_locators.push("widget_parts");
    let selection = select_root(&snapshot, &rp("/widgets/42/parts/7")).expect("should select");
    let err = walk(&factory, selection).expect_err("locator failure must propagate");
    assert!(matches!(err, RoutingFailure::InstantiationFailed { .. }));
}

#[test]
fn test_walk_prefers_method_over_locator_on_equal_template() {
    let class = ResourceClass::builder("Both", "/both")
        .locator("sub_locator", "/{id}")
        .method("get_direct", Method::GET, "/{id}")
        .build()
        .expect("should build");
    let snapshot = snapshot_of(vec![class]);
    let factory = MapFactory::new();
    let selection = select_root(&snapshot, &rp("/both/9")).expect("should select");
    let terminal = walk(&factory, selection).expect("walk should finish");
    // stopped at the terminal method, locator never invoked
    assert_eq!(terminal.object, "Both");
    assert_eq!(terminal.remainder.as_str(), "9");
}

#[test]
fn test_walk_distinct_template_tie_is_ambiguous() {
    let class = ResourceClass::builder("Tied", "/tied")
        .method("left", Method::GET, "/{p}/a")
        .method("right", Method::GET, "/a/{q}")
        .build()
        .expect("should build");
    let snapshot = snapshot_of(vec![class]);
    let factory = MapFactory::new();
    let selection = select_root(&snapshot, &rp("/tied/a/a")).expect("should select");
    assert!(matches!(
        walk(&factory, selection),
        Err(RoutingFailure::AmbiguousSubResource { .. })
    ));
}

// --- method selection -----------------------------------------------------

fn negotiating_class() -> Arc<ResourceClass> {
    ResourceClass::builder("Items", "/items")
        .method_with_media("get_json", Method::GET, "/{id}", &[], &["application/json"])
        .method_with_media("get_xml", Method::GET, "/{id}", &[], &["application/xml"])
        .method_with_media(
            "put_item",
            Method::PUT,
            "/{id}",
            &["application/json"],
            &[],
        )
        .build()
        .expect("Items should build")
}

fn selected_name(outcome: MethodOutcome) -> String {
    match outcome {
        MethodOutcome::Selected { method, .. } => method.name().to_string(),
        MethodOutcome::OptionsProbe { .. } => "<options>".to_string(),
    }
}

#[test]
fn test_select_by_accept_preference() {
    let class = negotiating_class();
    let accept = AcceptList::parse("application/json;q=1.0, application/xml;q=0.5");
    let outcome = select_method(&class, &rp("42"), &Method::GET, None, &accept)
        .expect("should select");
    assert_eq!(selected_name(outcome), "get_json");

    let accept = AcceptList::parse("application/xml;q=1.0, application/json;q=0.5");
    let outcome = select_method(&class, &rp("42"), &Method::GET, None, &accept)
        .expect("should select");
    assert_eq!(selected_name(outcome), "get_xml");
}

#[test]
fn test_not_acceptable() {
    let class = negotiating_class();
    let accept = AcceptList::parse("text/plain");
    assert!(matches!(
        select_method(&class, &rp("42"), &Method::GET, None, &accept),
        Err(RoutingFailure::NotAcceptable { .. })
    ));
}

#[test]
fn test_unsupported_media_type() {
    let class = negotiating_class();
    let ct = MediaType::new("text", "plain");
    assert!(matches!(
        select_method(&class, &rp("42"), &Method::PUT, Some(&ct), &AcceptList::default()),
        Err(RoutingFailure::UnsupportedMediaType { .. })
    ));
}

#[test]
fn test_method_not_allowed_carries_allow_set() {
    let class = negotiating_class();
    let err = select_method(
        &class,
        &rp("42"),
        &Method::DELETE,
        None,
        &AcceptList::default(),
    )
    .expect_err("DELETE is not declared");
    match err {
        RoutingFailure::MethodNotAllowed { allow, .. } => {
            assert!(allow.contains(&Method::GET));
            assert!(allow.contains(&Method::PUT));
            assert_eq!(allow.len(), 2);
        }
        other => panic!("expected MethodNotAllowed, got {other}"),
    }
}

#[test]
fn test_options_probe_exposes_pre_filter_verbs() {
    let class = negotiating_class();
    let outcome = select_method(
        &class,
        &rp("42"),
        &Method::OPTIONS,
        None,
        &AcceptList::default(),
    )
    .expect("bare OPTIONS is not a failure");
    match outcome {
        MethodOutcome::OptionsProbe { allow } => {
            assert_eq!(allow, vec![Method::GET, Method::PUT]);
        }
        MethodOutcome::Selected { .. } => panic!("no OPTIONS handler was declared"),
    }
}

#[test]
fn test_head_falls_back_to_get() {
    let class = ResourceClass::builder("HeadLess", "/headless")
        .method("get_it", Method::GET, "/{id}")
        .build()
        .expect("should build");
    let outcome = select_method(&class, &rp("1"), &Method::HEAD, None, &AcceptList::default())
        .expect("HEAD should fall back to GET");
    assert_eq!(selected_name(outcome), "get_it");
}

#[test]
fn test_head_prefers_explicit_head_over_get() {
    let class = ResourceClass::builder("Heady", "/heady")
        .method("get_it", Method::GET, "/{id}")
        .method("head_it", Method::HEAD, "/{id}")
        .build()
        .expect("should build");
    let outcome = select_method(&class, &rp("1"), &Method::HEAD, None, &AcceptList::default())
        .expect("should select");
    assert_eq!(selected_name(outcome), "head_it");
}

#[test]
fn test_equal_methods_tie_is_ambiguous() {
    let class = ResourceClass::builder("Twins", "/twins")
        .method_with_media("first", Method::GET, "/{id}", &[], &["application/json"])
        .method_with_media("second", Method::GET, "/{id}", &[], &["application/json"])
        .build()
        .expect("should build");
    let accept = AcceptList::parse("application/json");
    assert!(matches!(
        select_method(&class, &rp("1"), &Method::GET, None, &accept),
        Err(RoutingFailure::AmbiguousMethod { .. })
    ));
}

#[test]
fn test_consumes_specificity_is_primary_key() {
    // both consume the body, but the exact listing beats the wildcard
    let class = ResourceClass::builder("Consumers", "/consumers")
        .method_with_media("exact", Method::POST, "", &["application/json"], &[])
        .method_with_media("broad", Method::POST, "", &["*/*"], &[])
        .build()
        .expect("should build");
    let ct = MediaType::new("application", "json");
    let outcome = select_method(
        &class,
        &rp("/"),
        &Method::POST,
        Some(&ct),
        &AcceptList::default(),
    )
    .expect("should select");
    assert_eq!(selected_name(outcome), "exact");
}

fn crossing(name: &str, reversed: bool) -> Arc<ResourceClass> {
    // two methods each satisfy exactly one constraint of a json-in/json-out
    // request, one satisfies both
    let builder = ResourceClass::builder(name, "/mixed");
    let builder = if reversed {
        builder.method_with_media(
            "json_in_json_out",
            Method::POST,
            "",
            &["application/json"],
            &["application/json"],
        )
    } else {
        builder
    };
    let builder = builder
        .method_with_media(
            "json_in_xml_out",
            Method::POST,
            "",
            &["application/json"],
            &["application/xml"],
        )
        .method_with_media(
            "xml_in_json_out",
            Method::POST,
            "",
            &["application/xml"],
            &["application/json"],
        );
    let builder = if reversed {
        builder
    } else {
        builder.method_with_media(
            "json_in_json_out",
            Method::POST,
            "",
            &["application/json"],
            &["application/json"],
        )
    };
    builder.build().expect("should build")
}

#[test]
fn test_selection_intersects_body_and_accept_constraints() {
    // only the method satisfying both the consumed and the produced
    // constraint may win, regardless of declaration order
    let ct = MediaType::new("application", "json");
    let accept = AcceptList::parse("application/json");
    for reversed in [false, true] {
        let class = crossing("Mixed", reversed);
        let outcome = select_method(&class, &rp("/"), &Method::POST, Some(&ct), &accept)
            .expect("should select");
        assert_eq!(selected_name(outcome), "json_in_json_out");
    }
}

#[test]
fn test_methods_each_passing_one_constraint_do_not_resolve() {
    let class = ResourceClass::builder("Crossed", "/crossed")
        .method_with_media(
            "json_in_xml_out",
            Method::POST,
            "",
            &["application/json"],
            &["application/xml"],
        )
        .method_with_media(
            "xml_in_json_out",
            Method::POST,
            "",
            &["application/xml"],
            &["application/json"],
        )
        .build()
        .expect("should build");
    let ct = MediaType::new("application", "json");
    let accept = AcceptList::parse("application/json");
    // each method survives one filter in isolation, none survives both
    assert!(matches!(
        select_method(&class, &rp("/"), &Method::POST, Some(&ct), &accept),
        Err(RoutingFailure::NotAcceptable { .. })
    ));
}

#[test]
fn test_resource_method_not_found() {
    let class = negotiating_class();
    assert!(matches!(
        select_method(
            &class,
            &rp("42/extra"),
            &Method::GET,
            None,
            &AcceptList::default()
        ),
        Err(RoutingFailure::ResourceMethodNotFound { .. })
    ));
}
