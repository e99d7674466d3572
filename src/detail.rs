use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::client::PageSource;
use crate::models::DetailContent;
use crate::report::{FailureKind, FailureReporter};

const CONTEXT: &str = "event detail";

static PREAMBLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".preamble").expect("preamble selector"));
static EDITORIAL_BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".text-body.editorial-html").expect("editorial body selector"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Preamble,
    EditorialBody,
}

impl Role {
    fn selector(self) -> &'static Selector {
        match self {
            Role::Preamble => &*PREAMBLE_SELECTOR,
            Role::EditorialBody => &*EDITORIAL_BODY_SELECTOR,
        }
    }
}

/// Parsed detail page. Only role lookups are exposed.
pub struct DetailDocument {
    html: Html,
}

impl DetailDocument {
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    /// Inner markup of the first element carrying `role`, trimmed.
    pub fn find_by_role(&self, role: Role) -> Option<String> {
        self.html
            .select(role.selector())
            .next()
            .map(|element| element.inner_html().trim().to_string())
    }

    pub fn extract(&self) -> DetailContent {
        DetailContent {
            preamble: self.find_by_role(Role::Preamble).unwrap_or_default(),
            body: self.find_by_role(Role::EditorialBody).unwrap_or_default(),
        }
    }
}

pub fn extract_detail(raw: &str) -> DetailContent {
    DetailDocument::parse(raw).extract()
}

type Slot = Arc<OnceCell<DetailContent>>;

pub struct DetailResolver {
    source: Arc<dyn PageSource>,
    reporter: Arc<dyn FailureReporter>,
    base: Url,
    cache: Mutex<HashMap<String, Slot>>,
}

impl DetailResolver {
    pub fn new(source: Arc<dyn PageSource>, reporter: Arc<dyn FailureReporter>, base: Url) -> Self {
        Self {
            source,
            reporter,
            base,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `path` once per cache lifetime. Concurrent callers for the
    /// same path share the first fetch; failures resolve to empty content.
    pub async fn resolve_detail(&self, path: &str) -> DetailContent {
        let slot = self.slot(path);
        slot.get_or_init(|| self.fetch_detail(path)).await.clone()
    }

    #[cfg(test)]
    pub fn cached(&self, path: &str) -> Option<DetailContent> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(path).and_then(|slot| slot.get().cloned())
    }

    /// Drops every memoized page. In-flight resolutions still complete for
    /// their callers but no longer populate the cache.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn slot(&self, path: &str) -> Slot {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    async fn fetch_detail(&self, path: &str) -> DetailContent {
        let url = match self.base.join(path.trim_start_matches('/')) {
            Ok(url) => url,
            Err(err) => {
                self.reporter.report(
                    FailureKind::InvalidUrl,
                    CONTEXT,
                    &format!("bad detail path {path:?}: {err}"),
                );
                return DetailContent::default();
            }
        };
        debug!(%url, "fetching event detail");

        let raw = match self.source.fetch_text(&url).await {
            Ok(raw) => raw,
            Err(err) => {
                self.reporter
                    .report(FailureKind::NetworkFailure, CONTEXT, &err.to_string());
                return DetailContent::default();
            }
        };

        let content = extract_detail(&raw);
        if content.is_empty() {
            self.reporter.report(
                FailureKind::MalformedResponse,
                CONTEXT,
                &format!("no preamble or editorial body in {url}"),
            );
        }
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{base, RecordingReporter, ScriptedSource};

    const PAGE_URL: &str = "https://polisen.se/aktuellt/handelser/2024/maj/12/inbrott-stockholm/";
    const PAGE_PATH: &str = "/aktuellt/handelser/2024/maj/12/inbrott-stockholm/";

    const SAMPLE_PAGE: &str = r#"
    <html>
      <body>
        <div class="event-page">
          <h1>12 maj 10:31, Inbrott, Stockholm</h1>
          <div class="preamble"><p>Inbrott i lägenhet på Söder.</p></div>
          <div class="text-body editorial-html">
            <p>Polisen kallades till platsen.</p>
            <p>Ingen gripen.</p>
          </div>
        </div>
      </body>
    </html>
    "#;

    fn resolver(source: Arc<ScriptedSource>, reporter: Arc<RecordingReporter>) -> DetailResolver {
        DetailResolver::new(source, reporter, base())
    }

    #[test]
    fn extracts_inner_markup_of_both_roles() {
        let content = extract_detail(
            r#"<div class="preamble">P</div><div class="text-body editorial-html">B</div>"#,
        );
        assert_eq!(content, DetailContent::new("P", "B"));
    }

    #[test]
    fn extraction_keeps_nested_markup_without_wrapper() {
        let document = DetailDocument::parse(SAMPLE_PAGE);
        assert_eq!(
            document.find_by_role(Role::Preamble).as_deref(),
            Some("<p>Inbrott i lägenhet på Söder.</p>")
        );
        let body = document.find_by_role(Role::EditorialBody).expect("body");
        assert!(body.starts_with("<p>Polisen kallades till platsen.</p>"));
        assert!(body.ends_with("<p>Ingen gripen.</p>"));
        assert!(!body.contains("editorial-html"));
    }

    #[test]
    fn body_requires_both_classes() {
        let content = extract_detail(
            r#"<div class="text-body">nope</div><div class="editorial-html">nope</div>"#,
        );
        assert_eq!(content.body, "");
    }

    #[test]
    fn missing_elements_fall_back_to_empty() {
        assert_eq!(extract_detail("<html><body><p>moved</p></body></html>"), DetailContent::default());
        let preamble_only = extract_detail(r#"<div class="preamble">P</div>"#);
        assert_eq!(preamble_only, DetailContent::new("P", ""));
        assert!(!preamble_only.is_empty());
    }

    #[tokio::test]
    async fn resolves_and_memoizes_by_path() {
        let source = ScriptedSource::new();
        source.respond(PAGE_URL, SAMPLE_PAGE);
        let reporter = RecordingReporter::new();
        let resolver = resolver(source.clone(), reporter.clone());

        let first = resolver.resolve_detail(PAGE_PATH).await;
        let second = resolver.resolve_detail(PAGE_PATH).await;

        assert_eq!(first, second);
        assert_eq!(first.preamble, "<p>Inbrott i lägenhet på Söder.</p>");
        assert_eq!(source.calls_to(PAGE_URL), 1);
        assert_eq!(resolver.cached(PAGE_PATH), Some(first));
        assert!(reporter.kinds().is_empty());
    }

    #[tokio::test]
    async fn concurrent_resolutions_share_one_fetch() {
        let source = ScriptedSource::new();
        source.respond(PAGE_URL, SAMPLE_PAGE);
        let gate = source.gate(PAGE_URL);
        let resolver = resolver(source.clone(), RecordingReporter::new());

        let (first, second, _) = tokio::join!(
            resolver.resolve_detail(PAGE_PATH),
            resolver.resolve_detail(PAGE_PATH),
            async {
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert_eq!(first, second);
        assert_eq!(source.calls_to(PAGE_URL), 1);
    }

    #[tokio::test]
    async fn failed_fetch_resolves_empty_and_is_cached() {
        let source = ScriptedSource::new();
        source.fail(PAGE_URL, 500);
        let reporter = RecordingReporter::new();
        let resolver = resolver(source.clone(), reporter.clone());

        assert!(resolver.resolve_detail(PAGE_PATH).await.is_empty());
        assert!(resolver.resolve_detail(PAGE_PATH).await.is_empty());

        assert_eq!(source.calls_to(PAGE_URL), 1);
        assert_eq!(reporter.kinds(), vec![FailureKind::NetworkFailure]);
    }

    #[tokio::test]
    async fn page_without_targets_is_reported_not_raised() {
        let source = ScriptedSource::new();
        source.respond(PAGE_URL, "<html><body>redesigned</body></html>");
        let reporter = RecordingReporter::new();
        let resolver = resolver(source, reporter.clone());

        let content = resolver.resolve_detail(PAGE_PATH).await;

        assert_eq!(content, DetailContent::new("", ""));
        assert_eq!(reporter.kinds(), vec![FailureKind::MalformedResponse]);
    }

    #[tokio::test]
    async fn clear_forces_a_new_fetch() {
        let source = ScriptedSource::new();
        source.respond(PAGE_URL, SAMPLE_PAGE);
        let resolver = resolver(source.clone(), RecordingReporter::new());

        resolver.resolve_detail(PAGE_PATH).await;
        resolver.clear();
        assert_eq!(resolver.cached(PAGE_PATH), None);
        resolver.resolve_detail(PAGE_PATH).await;

        assert_eq!(source.calls_to(PAGE_URL), 2);
    }

    #[tokio::test]
    async fn relative_path_without_leading_slash_joins_base() {
        let source = ScriptedSource::new();
        source.respond("https://polisen.se/a/1", SAMPLE_PAGE);
        let resolver = resolver(source.clone(), RecordingReporter::new());

        let content = resolver.resolve_detail("a/1").await;

        assert!(!content.is_empty());
        assert_eq!(source.calls_to("https://polisen.se/a/1"), 1);
    }
}
