use url::Url;

/// Builds an absolute URL string from an endpoint and a path.
pub fn join(endpoint: &str, path: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(endpoint)?;
    url.set_path(path);
    Ok(url.to_string())
}

/// Fills `{}` placeholders in a path template, left to right. Extra
/// placeholders are left in place.
pub fn fill(template: &str, vals: &[&str]) -> String {
    let mut out = template.to_string();
    for val in vals {
        out = out.replacen("{}", val, 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_builds_absolute_url() {
        let cases = [
            (
                "https://example.com",
                "/path/to/resource",
                "https://example.com/path/to/resource",
            ),
            (
                "https://example.com:8080",
                "/search",
                "https://example.com:8080/search",
            ),
        ];
        for (endpoint, path, want) in cases {
            assert_eq!(join(endpoint, path).unwrap(), want);
        }
    }

    #[test]
    fn join_rejects_invalid_endpoint() {
        assert!(join("not a url", "/path").is_err());
    }

    #[test]
    fn fill_replaces_placeholders_in_order() {
        let cases: [(&str, &[&str], &str); 3] = [
            ("no placeholders", &[], "no placeholders"),
            ("single value {}", &["val1"], "single value val1"),
            ("multiple values {}, {}", &["val1", "val2"], "multiple values val1, val2"),
        ];
        for (template, vals, want) in cases {
            assert_eq!(fill(template, vals), want);
        }
    }

    #[test]
    fn join_and_fill_compose() {
        let path = fill("/path/{}/{}", &["to", "resource"]);
        assert_eq!(
            join("https://example.com", &path).unwrap(),
            "https://example.com/path/to/resource"
        );
    }
}
