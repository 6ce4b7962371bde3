use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::trace;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleHit {
    /// `None` when the search result carried no usable title.
    pub title: Option<String>,
}

#[async_trait]
pub trait ArticleSearch: Send + Sync {
    /// Hits in relevance order. Errors mean the search could not be completed.
    async fn search(&self, query: &str) -> AppResult<Vec<ArticleHit>>;
}

/// Full-text search against a MediaWiki `api.php` endpoint.
pub struct MediaWikiSearch {
    http: Client,
    endpoint: Url,
}

impl MediaWikiSearch {
    pub fn new(http: Client, config: &AppConfig) -> AppResult<Self> {
        let endpoint = Url::parse(&config.wiki_api_endpoint).map_err(|err| {
            AppError::Config(format!("invalid wiki api endpoint: {err}"))
        })?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl ArticleSearch for MediaWikiSearch {
    async fn search(&self, query: &str) -> AppResult<Vec<ArticleHit>> {
        #[derive(Deserialize)]
        struct Response {
            query: ResponseQuery,
        }

        #[derive(Deserialize)]
        struct ResponseQuery {
            #[serde(default)]
            search: Vec<ResponseHit>,
        }

        #[derive(Deserialize)]
        struct ResponseHit {
            title: Option<String>,
        }

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", query);

        let response = self.http.get(url).send().await?.error_for_status()?;
        let parsed: Response = response.json().await?;
        let hits = parsed
            .query
            .search
            .into_iter()
            .map(|hit| ArticleHit {
                title: hit.title.filter(|title| !title.trim().is_empty()),
            })
            .collect::<Vec<_>>();
        trace!(query, hits = hits.len(), "article search completed");
        Ok(hits)
    }
}

/// Link to an article: the base URL with the title appended as one escaped path segment.
pub fn article_url(base: &str, title: &str) -> AppResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|err| AppError::Config(format!("invalid wiki article base: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Config("wiki article base cannot take a path".into()))?
        .pop_if_empty()
        .push(title);
    Ok(url)
}
