//! Year / make / model extraction from listing titles

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fields recovered from a free-text title like `"2022 Chevrolet Spark"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
}

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern is valid"))
}

/// Split a listing title into year, make and model.
///
/// The leftmost year-like token is taken and cut out; any later ones stay
/// inside make/model. The rest splits on its first whitespace run into make
/// and model. No casing normalisation is applied.
pub fn parse_title(title: Option<&str>) -> ParsedTitle {
    let Some(title) = title else {
        return ParsedTitle::default();
    };

    let (year, cleaned) = match year_pattern().find(title) {
        Some(m) => {
            let year = m.as_str().parse::<i32>().ok();
            let mut cleaned = String::with_capacity(title.len());
            cleaned.push_str(&title[..m.start()]);
            cleaned.push_str(&title[m.end()..]);
            (year, cleaned)
        }
        None => (None, title.to_string()),
    };

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return ParsedTitle { year, make: None, model: None };
    }

    match cleaned.split_once(char::is_whitespace) {
        Some((make, rest)) => {
            let model = rest.trim_start();
            ParsedTitle {
                year,
                make: Some(make.to_string()),
                model: (!model.is_empty()).then(|| model.to_string()),
            }
        }
        None => ParsedTitle {
            year,
            make: Some(cleaned.to_string()),
            model: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_make_model() {
        let parsed = parse_title(Some("2022 Chevrolet Spark"));
        assert_eq!(parsed.year, Some(2022));
        assert_eq!(parsed.make.as_deref(), Some("Chevrolet"));
        assert_eq!(parsed.model.as_deref(), Some("Spark"));
    }

    #[test]
    fn test_multi_word_model() {
        let parsed = parse_title(Some("2019 Land Rover Range Rover Sport"));
        assert_eq!(parsed.make.as_deref(), Some("Land"));
        assert_eq!(parsed.model.as_deref(), Some("Rover Range Rover Sport"));
    }

    #[test]
    fn test_year_in_middle() {
        let parsed = parse_title(Some("Toyota 2015 Corolla"));
        assert_eq!(parsed.year, Some(2015));
        assert_eq!(parsed.make.as_deref(), Some("Toyota"));
        assert_eq!(parsed.model.as_deref(), Some("Corolla"));
    }

    #[test]
    fn test_no_year() {
        let parsed = parse_title(Some("Honda Civic"));
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.make.as_deref(), Some("Honda"));
        assert_eq!(parsed.model.as_deref(), Some("Civic"));
    }

    #[test]
    fn test_only_first_year_removed() {
        let parsed = parse_title(Some("2018 Ford Mustang 2019 Edition"));
        assert_eq!(parsed.year, Some(2018));
        assert_eq!(parsed.make.as_deref(), Some("Ford"));
        assert_eq!(parsed.model.as_deref(), Some("Mustang 2019 Edition"));
    }

    #[test]
    fn test_out_of_range_numbers_ignored() {
        let parsed = parse_title(Some("Peugeot 3008 GT"));
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.model.as_deref(), Some("3008 GT"));

        // Embedded digits are not a standalone token
        let parsed = parse_title(Some("BMW X2020i"));
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn test_year_only_and_empty() {
        let parsed = parse_title(Some("2020"));
        assert_eq!(parsed.year, Some(2020));
        assert!(parsed.make.is_none());
        assert!(parsed.model.is_none());

        assert_eq!(parse_title(Some("   ")), ParsedTitle::default());
        assert_eq!(parse_title(None), ParsedTitle::default());
    }

    #[test]
    fn test_single_word() {
        let parsed = parse_title(Some("Jeep"));
        assert_eq!(parsed.make.as_deref(), Some("Jeep"));
        assert!(parsed.model.is_none());
    }
}
