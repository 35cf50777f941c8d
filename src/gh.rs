// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! GitHub access for the Java agent instrumentation list.
//!
//! Requests go through `octocrab` on a private runtime so callers stay
//! synchronous. Every request is retried with exponential backoff.

use octocrab::Octocrab;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::{
    error::Error,
    instrumentation_sync::InstrumentationSource,
    retry::{RetryConfig, retry_with_backoff},
};

/// Upstream repository of the Java agent.
pub const DEFAULT_JAVAAGENT_REPO: &str = "open-telemetry/opentelemetry-java-instrumentation";
/// Instrumentation list inside the Java agent repository.
pub const DEFAULT_INSTRUMENTATION_LIST_PATH: &str = "docs/instrumentation-list.yaml";

const RAW_CONTENT_URL: &str = "https://raw.githubusercontent.com";
const RELEASES_PER_PAGE: u8 = 100;
const MAX_RELEASE_PAGES: u32 = 10;

/// Splits `owner/name` into its parts.
///
/// # Errors
///
/// Returns [`Error::Validation`] unless the slug has exactly two non-empty
/// parts.
pub fn split_repository(slug: &str,) -> Result<(&str, &str,), Error,>
{
    match slug.split_once('/',) {
        Some((owner, name,),) if !owner.is_empty() && !name.is_empty() && !name.contains('/',) => Ok((owner, name,),),
        _ => Err(Error::validation(format!("repository must be owner/name, got {slug:?}"),),),
    }
}

/// URL of `path` at `git_ref` on raw.githubusercontent.com.
pub fn raw_file_url(repository: &str, git_ref: &str, path: &str,) -> String
{
    format!("{RAW_CONTENT_URL}/{repository}/{git_ref}/{path}")
}

/// Blocking GitHub client for one repository.
pub struct GithubClient
{
    runtime:   Runtime,
    octocrab:  Octocrab,
    owner:     String,
    name:      String,
    list_path: String,
    retry:     RetryConfig,
}

impl GithubClient
{
    /// Client for `repository` (`owner/name`) reading `list_path`,
    /// authenticated when `token` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed repository and
    /// [`Error::Service`] when the runtime or HTTP client cannot start.
    pub fn new(repository: &str, list_path: &str, token: Option<&str,>,) -> Result<Self, Error,>
    {
        let (owner, name,) = split_repository(repository,)?;
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::service(format!("failed to start async runtime: {e}"),),)?;

        let octocrab = {
            let _guard = runtime.enter();
            let builder = Octocrab::builder();
            let builder = match token {
                Some(token,) if !token.is_empty() => builder.personal_token(token.to_string(),),
                _ => builder,
            };
            builder.build().map_err(|e| Error::service(format!("failed to initialize GitHub client: {e}"),),)?
        };

        Ok(Self {
            runtime,
            octocrab,
            owner: owner.to_string(),
            name: name.to_string(),
            list_path: list_path.to_string(),
            retry: RetryConfig::default(),
        },)
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig,) -> Self
    {
        self.retry = retry;
        self
    }

    /// `owner/name` of the repository.
    pub fn repository(&self,) -> String
    {
        format!("{}/{}", self.owner, self.name)
    }
}

impl InstrumentationSource for GithubClient
{
    fn latest_release_tag(&self,) -> Result<String, Error,>
    {
        let operation = format!("latest release of {}", self.repository());
        self.runtime.block_on(retry_with_backoff(&self.retry, &operation, || {
            let octocrab = self.octocrab.clone();
            let (owner, name,) = (self.owner.clone(), self.name.clone(),);
            async move {
                let release = octocrab
                    .repos(owner, name,)
                    .releases()
                    .get_latest()
                    .await
                    .map_err(|e| Error::service(format!("failed to fetch latest release: {e}"),),)?;
                Ok(release.tag_name,)
            }
        },),)
    }

    fn release_tags(&self,) -> Result<Vec<String,>, Error,>
    {
        let mut tags = Vec::new();
        for page in 1..=MAX_RELEASE_PAGES {
            let operation = format!("releases page {page} of {}", self.repository());
            let batch: Vec<String,> = self.runtime.block_on(retry_with_backoff(&self.retry, &operation, || {
                let octocrab = self.octocrab.clone();
                let (owner, name,) = (self.owner.clone(), self.name.clone(),);
                async move {
                    let releases = octocrab
                        .repos(owner, name,)
                        .releases()
                        .list()
                        .per_page(RELEASES_PER_PAGE,)
                        .page(page,)
                        .send()
                        .await
                        .map_err(|e| Error::service(format!("failed to list releases: {e}"),),)?;
                    Ok(releases.items.into_iter().filter(|release| !release.draft,).map(|release| release.tag_name,).collect(),)
                }
            },),)?;

            let last_page = batch.len() < usize::from(RELEASES_PER_PAGE,);
            tags.extend(batch,);
            if last_page {
                break;
            }
        }
        debug!("Found {} release tags for {}", tags.len(), self.repository());
        Ok(tags,)
    }

    fn fetch_instrumentation_list(&self, git_ref: &str,) -> Result<String, Error,>
    {
        let url = raw_file_url(&self.repository(), git_ref, &self.list_path,);
        let operation = format!("fetch {url}");
        self.runtime.block_on(retry_with_backoff(&self.retry, &operation, || {
            let octocrab = self.octocrab.clone();
            let url = url.clone();
            async move {
                let response = octocrab
                    ._get(url.as_str(),)
                    .await
                    .map_err(|e| Error::service(format!("failed to fetch instrumentation list: {e}"),),)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::service(format!("fetching {url} returned {status}"),),);
                }
                octocrab
                    .body_to_string(response,)
                    .await
                    .map_err(|e| Error::service(format!("failed to read instrumentation list: {e}"),),)
            }
        },),)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn repository_slug_is_split()
    {
        assert_eq!(split_repository(DEFAULT_JAVAAGENT_REPO,).expect("valid slug",), (
            "open-telemetry",
            "opentelemetry-java-instrumentation"
        ));
        for slug in ["", "owner", "owner/", "/name", "a/b/c"] {
            assert!(split_repository(slug,).is_err(), "{slug}");
        }
    }

    #[test]
    fn raw_url_points_at_ref()
    {
        assert_eq!(
            raw_file_url(DEFAULT_JAVAAGENT_REPO, "v2.24.0", DEFAULT_INSTRUMENTATION_LIST_PATH,),
            "https://raw.githubusercontent.com/open-telemetry/opentelemetry-java-instrumentation/v2.24.0/docs/instrumentation-list.yaml"
        );
    }

    #[test]
    fn client_rejects_malformed_repository()
    {
        let result = GithubClient::new("not-a-slug", DEFAULT_INSTRUMENTATION_LIST_PATH, None,);
        assert!(matches!(result, Err(Error::Validation { .. })));
    }
}
