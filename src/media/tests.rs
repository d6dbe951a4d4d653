use super::core::{AcceptList, MediaType};

#[test]
fn test_parse_basic() {
    let m = MediaType::parse("application/json").expect("should parse");
    assert_eq!(m.main_type(), "application");
    assert_eq!(m.sub_type(), "json");
}

#[test]
fn test_parse_ignores_parameters_and_case() {
    let m = MediaType::parse("Text/HTML; charset=utf-8").expect("should parse");
    assert_eq!(m.to_string(), "text/html");
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(MediaType::parse("json").is_err());
    assert!(MediaType::parse("/json").is_err());
    assert!(MediaType::parse("application/").is_err());
    assert!(MediaType::parse("*/json").is_err());
}

#[test]
fn test_includes_wildcards() {
    let any = MediaType::any();
    let app_any = MediaType::new("application", "*");
    let json = MediaType::new("application", "json");
    let xml = MediaType::new("application", "xml");

    assert!(any.includes(&json));
    assert!(app_any.includes(&json));
    assert!(app_any.includes(&xml));
    assert!(json.includes(&json));
    assert!(!json.includes(&xml));
    assert!(!json.includes(&app_any));
    assert!(!app_any.includes(&any));
}

#[test]
fn test_compatible_is_symmetric() {
    let json = MediaType::new("application", "json");
    let any = MediaType::any();
    assert!(json.compatible(&any));
    assert!(any.compatible(&json));
    assert!(!json.compatible(&MediaType::new("text", "plain")));
}

#[test]
fn test_accept_list_orders_by_quality() {
    let accept = AcceptList::parse("application/xml;q=0.5, application/json;q=1.0");
    let types: Vec<String> = accept.types().map(|t| t.to_string()).collect();
    assert_eq!(types, vec!["application/json", "application/xml"]);
}

#[test]
fn test_accept_list_stable_within_equal_quality() {
    let accept = AcceptList::parse("application/json, application/xml, text/plain;q=0.2");
    let types: Vec<String> = accept.types().map(|t| t.to_string()).collect();
    assert_eq!(
        types,
        vec!["application/json", "application/xml", "text/plain"]
    );
}

#[test]
fn test_accept_list_skips_malformed_entries() {
    // "garbage" has no '/', the unparsable q falls back to 1.0
    let accept = AcceptList::parse("garbage, application/json;q=nope, text/plain");
    let types: Vec<String> = accept.types().map(|t| t.to_string()).collect();
    assert_eq!(types, vec!["application/json", "text/plain"]);
}

#[test]
fn test_empty_accept_list() {
    assert!(AcceptList::parse("").is_empty());
    assert!(AcceptList::default().is_empty());
}
