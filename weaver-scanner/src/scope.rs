use url::Url;

fn is_crawlable_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Decides whether a discovered link may enter the frontier.
///
/// With `same_domain_only` the candidate host must equal the seed host exactly;
/// otherwise subdomains of the seed host are accepted as well. Non-http(s)
/// candidates are always rejected.
pub fn is_in_scope(candidate: &Url, seed: &Url, same_domain_only: bool) -> bool {
    if !is_crawlable_scheme(candidate) {
        return false;
    }

    match (candidate.host_str(), seed.host_str()) {
        (Some(host), Some(seed_host)) => host_matches(host, seed_host, same_domain_only),
        _ => false,
    }
}

fn host_matches(host: &str, seed_host: &str, same_domain_only: bool) -> bool {
    if host == seed_host {
        return true;
    }
    !same_domain_only
        && host
            .strip_suffix(seed_host)
            .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
}

/// Scope filter bound to one run's seed.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    seed: Url,
    same_domain_only: bool,
}

impl ScopeFilter {
    pub fn new(seed: Url, same_domain_only: bool) -> Self {
        Self {
            seed,
            same_domain_only,
        }
    }

    pub fn is_in_scope(&self, candidate: &Url) -> bool {
        is_in_scope(candidate, &self.seed, self.same_domain_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_host_in_scope_both_modes() {
        let seed = url("https://example.com/");
        for same_domain_only in [true, false] {
            assert!(is_in_scope(&url("https://example.com/a"), &seed, same_domain_only));
        }
    }

    #[test]
    fn test_scheme_change_within_http_family_allowed() {
        let seed = url("https://example.com/");
        assert!(is_in_scope(&url("http://example.com/a"), &seed, true));
    }

    #[test]
    fn test_subdomain_rejected_when_same_domain_only() {
        let seed = url("https://example.com/");
        assert!(!is_in_scope(&url("https://blog.example.com/"), &seed, true));
    }

    #[test]
    fn test_subdomain_accepted_when_not_same_domain_only() {
        let seed = url("https://example.com/");
        assert!(is_in_scope(&url("https://blog.example.com/"), &seed, false));
        assert!(is_in_scope(&url("https://a.b.example.com/"), &seed, false));
    }

    #[test]
    fn test_suffix_without_dot_is_not_subdomain() {
        let seed = url("https://example.com/");
        assert!(!is_in_scope(&url("https://badexample.com/"), &seed, false));
    }

    #[test]
    fn test_parent_domain_out_of_scope() {
        let seed = url("https://www.example.com/");
        assert!(!is_in_scope(&url("https://example.com/"), &seed, false));
    }

    #[test]
    fn test_other_domain_out_of_scope() {
        let seed = url("https://example.com/");
        assert!(!is_in_scope(&url("https://other.com/x"), &seed, true));
        assert!(!is_in_scope(&url("https://other.com/x"), &seed, false));
    }

    #[test]
    fn test_non_http_schemes_out_of_scope() {
        let seed = url("https://example.com/");
        assert!(!is_in_scope(&url("mailto:me@example.com"), &seed, false));
        assert!(!is_in_scope(&url("ftp://example.com/file"), &seed, false));
    }

    #[test]
    fn test_filter_wraps_free_function() {
        let filter = ScopeFilter::new(url("https://example.com/start"), false);
        assert!(filter.is_in_scope(&url("https://docs.example.com/")));
        assert!(!filter.is_in_scope(&url("https://example.org/")));
    }
}
