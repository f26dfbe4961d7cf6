use std::fmt;
use url::Url;

/// Language/region tag naming a rule directory (`en_US`, `en_GB`, `fr`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Locale(tag.into().replace('-', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a bare English tag that needs a regional refinement.
    pub fn is_generic_english(&self) -> bool {
        self.0.eq_ignore_ascii_case("en")
    }

    /// Refine generic English from the page host: American-style TLDs map to
    /// `en_US`, `.ru` to `ru`, anything else to `en_GB`. Without a URL, `en_US`.
    /// Other locales are returned unchanged.
    pub fn refine(&self, url: Option<&Url>) -> Locale {
        if !self.is_generic_english() {
            return self.clone();
        }
        let Some(host) = url.and_then(|u| u.host_str()) else {
            return Locale::new("en_US");
        };
        if [".us", ".com", ".org", ".tv", ".net"].iter().any(|tld| host.ends_with(tld)) {
            Locale::new("en_US")
        } else if host.ends_with(".ru") {
            Locale::new("ru")
        } else {
            Locale::new("en_GB")
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::new("en")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(s: &str) -> Self {
        Locale::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn english_refined_from_host() {
        let en = Locale::new("en");
        assert_eq!(en.refine(Some(&url("http://news.example.com/a"))).as_str(), "en_US");
        assert_eq!(en.refine(Some(&url("http://bbc.co.uk/news"))).as_str(), "en_GB");
        assert_eq!(en.refine(Some(&url("http://lenta.ru/x"))).as_str(), "ru");
        assert_eq!(en.refine(None).as_str(), "en_US");
    }

    #[test]
    fn specific_locale_untouched() {
        assert_eq!(Locale::new("fr").refine(Some(&url("http://example.com"))).as_str(), "fr");
        assert_eq!(Locale::new("en-GB").as_str(), "en_GB");
    }
}
