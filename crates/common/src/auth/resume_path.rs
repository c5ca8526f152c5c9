//! Login page scraping
//!
//! When the authorization endpoint answers with a login page instead of a
//! redirect, the credential submission target ("resume path") has to be
//! pulled out of the HTML. Extraction is an ordered list of independent
//! strategies; the first one that matches wins.

use mystar_domain::{MyStarError, Result};
use regex::Regex;
use tracing::debug;

/// One way of locating the resume path in a login page.
pub trait ResumePathExtractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Raw (still HTML-escaped) path, if this strategy recognises the page.
    fn try_extract(&self, html: &str) -> Option<String>;
}

/// Strategy backed by a single regular expression.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    name: &'static str,
    regex: Regex,
    group: usize,
}

impl RegexExtractor {
    /// # Errors
    /// Returns the compile error of an invalid pattern.
    pub fn new(name: &'static str, pattern: &str, group: usize) -> std::result::Result<Self, regex::Error> {
        Ok(Self { name, regex: Regex::new(pattern)?, group })
    }
}

impl ResumePathExtractor for RegexExtractor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, html: &str) -> Option<String> {
        self.regex
            .captures(html)
            .and_then(|captures| captures.get(self.group))
            .map(|m| m.as_str().to_string())
            .filter(|path| !path.is_empty())
    }
}

/// Ordered extractor list
pub struct ResumePathScraper {
    extractors: Vec<Box<dyn ResumePathExtractor>>,
}

impl std::fmt::Debug for ResumePathScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.extractors.iter().map(|e| e.name())).finish()
    }
}

impl ResumePathScraper {
    /// Scraper with the provider's known page layouts, in precedence order:
    /// JavaScript assignment, generic `action=`/`url:` attributes, bare
    /// `/as/<token>` path, `<form action>`.
    ///
    /// # Errors
    /// [`MyStarError::Parse`] if a built-in pattern fails to compile.
    pub fn standard() -> Result<Self> {
        let patterns: [(&'static str, &str, usize); 7] = [
            ("js_assignment", r#"(?:resumePath|pf\.resumePath)\s*[:=]\s*['"]([^'"]+)['"]"#, 1),
            ("object_property", r#"(?:url|action):\s*"([^"]+)""#, 1),
            ("action_attribute", r#"action="([^"]+)""#, 1),
            ("action_property", r"action:\s*'([^']+)'", 1),
            ("url_property", r"url:\s*'([^']+)'", 1),
            ("bare_path", r"/as/[a-zA-Z0-9\-_/]+", 0),
            ("form_action", r#"<form[^>]+action=['"]([^'"]+)['"]"#, 1),
        ];

        let extractors = patterns
            .into_iter()
            .map(|(name, pattern, group)| {
                RegexExtractor::new(name, pattern, group)
                    .map(|e| Box::new(e) as Box<dyn ResumePathExtractor>)
                    .map_err(|err| MyStarError::Parse(format!("invalid pattern {name}: {err}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { extractors })
    }

    #[must_use]
    pub fn with_extractors(extractors: Vec<Box<dyn ResumePathExtractor>>) -> Self {
        Self { extractors }
    }

    /// Append a strategy with the lowest precedence.
    pub fn push(&mut self, extractor: Box<dyn ResumePathExtractor>) {
        self.extractors.push(extractor);
    }

    /// Resume path of the page, with `&amp;` unescaped.
    ///
    /// # Errors
    /// [`MyStarError::Parse`] when no strategy matches; the login page
    /// layout has changed.
    pub fn extract(&self, html: &str) -> Result<String> {
        for extractor in &self.extractors {
            if let Some(path) = extractor.try_extract(html) {
                debug!(strategy = extractor.name(), "resume path found");
                return Ok(path.replace("&amp;", "&"));
            }
        }
        Err(MyStarError::Parse("no resume path found in login page".to_string()))
    }
}

/// Absolute submission URL for a scraped path.
///
/// Absolute URLs are used as-is; anything else is appended to the provider
/// base URL.
#[must_use]
pub fn resolve_resume_url(provider_url: &str, resume_path: &str) -> String {
    if resume_path.starts_with("http://") || resume_path.starts_with("https://") {
        resume_path.to_string()
    } else {
        format!("{}{}", provider_url.trim_end_matches('/'), resume_path)
    }
}

#[cfg(test)]
mod tests {
    use mystar_domain::ErrorKind;

    use super::*;

    fn scraper() -> ResumePathScraper {
        ResumePathScraper::standard().unwrap()
    }

    #[test]
    fn javascript_assignment_takes_precedence() {
        let html = r#"<form action="/as/other/resume"></form>
            <script>var pf = {}; pf.resumePath = '/as/JS123/resume/as/authorization.ping';</script>"#;
        assert_eq!(scraper().extract(html).unwrap(), "/as/JS123/resume/as/authorization.ping");
    }

    #[test]
    fn generic_action_attribute() {
        let html = r#"<html><body><div action="/as/XYZ/resume"></div></body></html>"#;
        assert_eq!(scraper().extract(html).unwrap(), "/as/XYZ/resume");
    }

    #[test]
    fn single_quoted_url_property() {
        let html = "<script>submit({ url: '/as/Q1/resume/as/authorization.ping' })</script>";
        assert_eq!(scraper().extract(html).unwrap(), "/as/Q1/resume/as/authorization.ping");
    }

    #[test]
    fn bare_path_fallback() {
        let html = "<p>continue at /as/ABC-1_2/resume please</p>";
        assert_eq!(scraper().extract(html).unwrap(), "/as/ABC-1_2/resume");
    }

    #[test]
    fn form_action_with_single_quotes() {
        let html = "<form method='post' action='/login/continue'></form>";
        assert_eq!(scraper().extract(html).unwrap(), "/login/continue");
    }

    #[test]
    fn html_entities_are_unescaped() {
        let html = r#"<script>resumePath = "/as/R/resume?a=1&amp;b=2";</script>"#;
        assert_eq!(scraper().extract(html).unwrap(), "/as/R/resume?a=1&b=2");
    }

    #[test]
    fn unknown_layout_is_parse_error() {
        let err = scraper().extract("<html><body>Hello</body></html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn custom_strategy_can_be_appended() {
        struct DataAttribute;
        impl ResumePathExtractor for DataAttribute {
            fn name(&self) -> &'static str {
                "data_attribute"
            }
            fn try_extract(&self, html: &str) -> Option<String> {
                html.split("data-resume=").nth(1)?.split('>').next().map(str::to_string)
            }
        }

        let mut scraper = ResumePathScraper::with_extractors(Vec::new());
        scraper.push(Box::new(DataAttribute));
        assert_eq!(scraper.extract("<div data-resume=/x/y>").unwrap(), "/x/y");
    }

    #[test]
    fn resolve_keeps_absolute_urls() {
        assert_eq!(
            resolve_resume_url("https://id.example.com/", "/as/X/resume"),
            "https://id.example.com/as/X/resume"
        );
        assert_eq!(
            resolve_resume_url("https://id.example.com", "https://other.example.com/as/X"),
            "https://other.example.com/as/X"
        );
    }
}
