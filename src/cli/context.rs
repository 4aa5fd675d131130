//! Service handles shared by the commands.
//!
//! Opening a handle resolves every setting and credential it needs, so a
//! missing API key is reported before any request is made.

use storydesk::cms::{self, Story, StoryFetch, StoryFetcher, StoryblokClient};
use storydesk::config::{resolve_credential, Config, ConfigError, Service};
use storydesk::crm::{self, Company, HubspotClient, LookupError};

/// Connection to the CMS with its story cache.
pub struct CmsSession {
    space_id: String,
    editor_url: String,
    default_published_only: bool,
    fetcher: StoryFetcher<StoryblokClient>,
}

impl CmsSession {
    /// Opens a CMS session from the configuration.
    pub fn open(config: &Config) -> Result<Self, ConfigError> {
        let space_id = config.space_id()?.to_string();
        let credential = resolve_credential(Service::Cms)?;
        let http = config.http.build_client()?;
        tracing::debug!("Using CMS key from {}", credential.source);

        let client = StoryblokClient::new(http, &config.cms.base_url, &space_id, &credential.value);
        let fetcher = StoryFetcher::new(client).published_only(config.cms.published_only);

        Ok(Self {
            space_id,
            editor_url: config.cms.editor_url.clone(),
            default_published_only: config.cms.published_only,
            fetcher,
        })
    }

    /// Returns the stories, from cache when fresh.
    ///
    /// `include_drafts` lifts the published-only setting for this call.
    /// Switching modes drops the cache.
    pub fn stories(&mut self, include_drafts: bool, force_refresh: bool) -> StoryFetch {
        let published_only = self.default_published_only && !include_drafts;
        self.fetcher.set_published_only(published_only);
        self.fetcher.get_stories(force_refresh)
    }

    /// Drops the cached stories.
    pub fn clear_cache(&self) {
        self.fetcher.invalidate();
    }

    /// Returns the editor link for a story.
    pub fn editor_link(&self, story: &Story) -> String {
        cms::editor_url(&self.editor_url, &self.space_id, story.id)
    }
}

/// Connection to the CRM.
pub struct CrmSession {
    client: HubspotClient,
    app_url: String,
    portal_id: Option<String>,
}

impl CrmSession {
    /// Opens a CRM session from the configuration.
    pub fn open(config: &Config) -> Result<Self, ConfigError> {
        let credential = resolve_credential(Service::Crm)?;
        let http = config.http.build_client()?;
        tracing::debug!("Using CRM key from {}", credential.source);

        Ok(Self {
            client: HubspotClient::new(http, &config.crm.base_url, &credential.value),
            app_url: config.crm.app_url.clone(),
            portal_id: config.crm.portal_id.clone().filter(|p| !p.trim().is_empty()),
        })
    }

    /// Looks up a company. Every call is a live request.
    pub fn lookup(&self, company_id: &str) -> Result<Company, LookupError> {
        crm::lookup_company(&self.client, company_id)
    }

    /// Returns the web link for a company record, if the portal is known.
    pub fn record_link(&self, company_id: &str) -> Option<String> {
        self.portal_id
            .as_deref()
            .map(|portal| crm::record_url(&self.app_url, portal, company_id))
    }
}
