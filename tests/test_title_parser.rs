//! Integration test: listing title parsing

use autoprice::preprocessing::{parse_title, ParsedTitle};

#[test]
fn test_year_make_model() {
    let parsed = parse_title(Some("2020 Toyota Camry"));
    assert_eq!(
        parsed,
        ParsedTitle {
            year: Some(2020),
            make: Some("Toyota".to_string()),
            model: Some("Camry".to_string()),
        }
    );
}

#[test]
fn test_multi_word_model_kept_whole() {
    let parsed = parse_title(Some("2017 Land Rover Range Rover Sport"));
    assert_eq!(parsed.year, Some(2017));
    assert_eq!(parsed.make.as_deref(), Some("Land"));
    assert_eq!(parsed.model.as_deref(), Some("Rover Range Rover Sport"));
}

#[test]
fn test_year_token_removed_from_make_and_model() {
    for title in ["2019 Honda Accord", "Honda 2019 Accord", "Honda Accord 2019"] {
        let parsed = parse_title(Some(title));
        assert_eq!(parsed.year, Some(2019), "title {:?}", title);
        let rest = format!(
            "{} {}",
            parsed.make.clone().unwrap_or_default(),
            parsed.model.clone().unwrap_or_default()
        );
        assert!(!rest.contains("2019"), "year leaked into {:?}", rest);
        assert_eq!(parsed.make.as_deref(), Some("Honda"));
    }
}

#[test]
fn test_no_year_uses_unmodified_title() {
    let parsed = parse_title(Some("Honda Civic"));
    assert_eq!(parsed.year, None);
    assert_eq!(parsed.make.as_deref(), Some("Honda"));
    assert_eq!(parsed.model.as_deref(), Some("Civic"));
}

#[test]
fn test_numbers_outside_year_range_are_not_years() {
    let parsed = parse_title(Some("Peugeot 3008 GT"));
    assert_eq!(parsed.year, None);
    assert_eq!(parsed.model.as_deref(), Some("3008 GT"));

    let parsed = parse_title(Some("1899 Benz Motorwagen"));
    assert_eq!(parsed.year, None);
    assert_eq!(parsed.make.as_deref(), Some("1899"));
}

#[test]
fn test_year_inside_a_longer_number_is_ignored() {
    let parsed = parse_title(Some("Ford F20150 Custom"));
    assert_eq!(parsed.year, None);
}

#[test]
fn test_missing_or_empty_title() {
    assert_eq!(parse_title(None), ParsedTitle::default());
    assert_eq!(parse_title(Some("   ")), ParsedTitle::default());

    let parsed = parse_title(Some("2018"));
    assert_eq!(parsed.year, Some(2018));
    assert_eq!(parsed.make, None);
    assert_eq!(parsed.model, None);
}

#[test]
fn test_single_word_title_has_no_model() {
    let parsed = parse_title(Some("2021 Tesla"));
    assert_eq!(parsed.make.as_deref(), Some("Tesla"));
    assert_eq!(parsed.model, None);
}
