/// Host marker identifying the service's primary deployment.
pub const PRIMARY_HOST_MARKER: &str = "ikuuu.nl";

/// Alternate deployment tried after the primary.
pub const ALTERNATE_DOMAIN: &str = "https://ikuuu.fyi";

/// Ordered, deduplicated list of base URLs to attempt for each account.
///
/// The configured domain always comes first; the known alternate is appended
/// only when the configured domain is the known primary. Trailing slashes are
/// trimmed so endpoint paths can be appended directly.
pub fn fallback_domains(primary: &str) -> Vec<String> {
    let primary = primary.trim().trim_end_matches('/').to_string();
    let mut domains = vec![primary];
    if domains[0].contains(PRIMARY_HOST_MARKER) && !domains.iter().any(|d| d == ALTERNATE_DOMAIN)
    {
        domains.push(ALTERNATE_DOMAIN.to_string());
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_marker_adds_alternate() {
        let domains = fallback_domains("https://ikuuu.nl");
        assert_eq!(domains, vec!["https://ikuuu.nl", ALTERNATE_DOMAIN]);
    }

    #[test]
    fn test_other_domain_alone() {
        let domains = fallback_domains("https://example.org");
        assert_eq!(domains, vec!["https://example.org"]);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let domains = fallback_domains("https://ikuuu.nl/");
        assert_eq!(domains[0], "https://ikuuu.nl");
        assert_eq!(domains.len(), 2);
    }

    #[test]
    fn test_alternate_as_primary_not_duplicated() {
        let domains = fallback_domains(ALTERNATE_DOMAIN);
        assert_eq!(domains, vec![ALTERNATE_DOMAIN]);
    }
}
