use std::path::Path;

use super::*;

const MINIMAL: &str = r#"
stores:
  - store_id: Makro
    display_name: Makro
    base_url: https://www.makro.co.za/
    search_input: "id:js-site-search-input"
    submit: { kind: enter_key }
    first_result: "xpath://div[@class='result'][1]"
    price_locators:
      - "class:product-PromotionSection"
      - "class:product-ProductNamePrice"
    name_locator: "class:name"
    price_rule: { kind: minor_units }
"#;

fn store(id: &str) -> StoreId {
    id.parse().unwrap()
}

fn registry(yaml: &str) -> Result<SiteRegistry, ConfigError> {
    SiteRegistry::from_yaml(yaml)
}

#[test]
fn minimal_profile_gets_defaults() {
    let reg = registry(MINIMAL).unwrap();
    let profile = reg.profile_for(&store("makro")).unwrap();
    assert_eq!(profile.title_separator, "|");
    assert_eq!(profile.url_rewrite, UrlRewrite::Unchanged);
    assert!(profile.no_results_marker.is_none());
    assert_eq!(profile.price_rule.currency(), "R");
    assert_eq!(profile.submit, SubmitAction::EnterKey);
    assert_eq!(
        profile.first_result,
        Locator::XPath("//div[@class='result'][1]".to_string())
    );
}

#[test]
fn store_id_is_lowercased() {
    let reg = registry(MINIMAL).unwrap();
    assert_eq!(reg.store_ids(), vec![store("makro")]);
    assert_eq!(store(" PnP ").as_str(), "pnp");
}

#[test]
fn store_id_rejects_spaces() {
    assert!("pick n pay".parse::<StoreId>().is_err());
    assert!("".parse::<StoreId>().is_err());
}

#[test]
fn profile_for_unknown_store_errors() {
    let reg = registry(MINIMAL).unwrap();
    let err = reg.profile_for(&store("spar")).unwrap_err();
    assert_eq!(err.store, "spar");
    assert!(err.to_string().contains("spar"));
}

#[test]
fn locator_parses_all_kinds() {
    assert_eq!(
        "id:fldSearch".parse::<Locator>().unwrap(),
        Locator::Id("fldSearch".to_string())
    );
    assert_eq!(
        "class:heading--400 heading--sub".parse::<Locator>().unwrap(),
        Locator::Class("heading--400 heading--sub".to_string())
    );
    assert_eq!(
        "css:div.price > span".parse::<Locator>().unwrap(),
        Locator::Css("div.price > span".to_string())
    );
    assert_eq!(
        r#"xpath://*[@id="pos_link_0"]"#.parse::<Locator>().unwrap(),
        Locator::XPath(r#"//*[@id="pos_link_0"]"#.to_string())
    );
}

#[test]
fn locator_display_matches_config_syntax() {
    let locator: Locator = "class:price".parse().unwrap();
    assert_eq!(locator.to_string(), "class:price");
}

#[test]
fn locator_rejects_unknown_kind_and_empty_value() {
    let err = "name:price".parse::<Locator>().unwrap_err();
    assert!(err.to_string().contains("unknown locator kind"));
    let err = "class:  ".parse::<Locator>().unwrap_err();
    assert!(err.to_string().contains("empty value"));
    assert!("price".parse::<Locator>().is_err());
}

#[test]
fn submit_click_and_major_units_parse() {
    let yaml = MINIMAL
        .replace(
            "submit: { kind: enter_key }",
            "submit: { kind: click, target: \"css:form button\" }",
        )
        .replace(
            "price_rule: { kind: minor_units }",
            "price_rule: { kind: major_units, currency: \"$\" }\n    url_rewrite: { kind: product_path, marker: /p/ }",
        );
    let reg = registry(&yaml).unwrap();
    let profile = reg.profile_for(&store("makro")).unwrap();
    assert_eq!(
        profile.submit,
        SubmitAction::Click {
            target: Locator::Css("form button".to_string())
        }
    );
    assert_eq!(
        profile.price_rule,
        PriceRule::MajorUnits {
            currency: "$".to_string()
        }
    );
    assert_eq!(
        profile.url_rewrite,
        UrlRewrite::ProductPath {
            marker: "/p/".to_string()
        }
    );
}

#[test]
fn validate_rejects_duplicate_store_id() {
    let yaml = format!("{MINIMAL}{}", MINIMAL.replace("stores:\n", ""));
    let err = registry(&yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate store id"));
}

#[test]
fn validate_rejects_missing_price_locators() {
    let yaml = MINIMAL.replace(
        "price_locators:\n      - \"class:product-PromotionSection\"\n      - \"class:product-ProductNamePrice\"",
        "price_locators: []",
    );
    let err = registry(&yaml).unwrap_err();
    assert!(err.to_string().contains("at least one price locator"));
}

#[test]
fn validate_rejects_non_http_base_url() {
    let yaml = MINIMAL.replace("https://www.makro.co.za/", "www.makro.co.za");
    let err = registry(&yaml).unwrap_err();
    assert!(err.to_string().contains("base_url"));
}

#[test]
fn validate_rejects_empty_currency() {
    let yaml = MINIMAL.replace(
        "price_rule: { kind: minor_units }",
        "price_rule: { kind: minor_units, currency: \"\" }",
    );
    let err = registry(&yaml).unwrap_err();
    assert!(err.to_string().contains("empty currency"));
}

#[test]
fn malformed_locator_fails_parse() {
    let yaml = MINIMAL.replace("\"class:name\"", "\"label:name\"");
    let err = registry(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::ProfilesFileParse(_)));
}

#[test]
fn resolve_name_matches_id_or_display_name() {
    let reg = SiteRegistry::builtin().unwrap();
    assert_eq!(
        reg.resolve_name("PNP").map(|p| p.store_id.as_str()),
        Some("pnp")
    );
    assert_eq!(
        reg.resolve_name(" pick n pay ").map(|p| p.store_id.as_str()),
        Some("pnp")
    );
    assert!(reg.resolve_name("Checkers").is_none());
}

#[test]
fn price_rule_render_uses_currency_and_two_decimals() {
    let rule = PriceRule::MinorUnits {
        currency: "R".to_string(),
    };
    assert_eq!(rule.render(Decimal::new(1999, 2)), "R19.99");
    assert_eq!(rule.render(Decimal::new(5, 0)), "R5.00");
}

#[test]
fn builtin_table_has_every_store_in_order() {
    let reg = SiteRegistry::builtin().unwrap();
    let ids: Vec<String> = reg.store_ids().into_iter().map(String::from).collect();
    assert_eq!(ids, ["makro", "game", "pnp", "woolworths", "takealot"]);
    let woolies = reg.profile_for(&store("woolworths")).unwrap();
    assert_eq!(
        woolies.url_rewrite,
        UrlRewrite::ProductPath {
            marker: "/_/".to_string()
        }
    );
}

#[test]
fn load_profiles_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("stores.yaml");
    assert!(
        path.exists(),
        "stores.yaml missing at {path:?}; required for this test"
    );
    let result = load_profiles(&path);
    assert!(result.is_ok(), "failed to load stores.yaml: {result:?}");
    assert_eq!(result.unwrap().profiles().count(), 5);
}

#[test]
fn load_profiles_missing_file_is_io_error() {
    let err = load_profiles(Path::new("/definitely/not/here/stores.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ProfilesFileIo { .. }));
}
