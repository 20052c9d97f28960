use {genolink_config::ProviderSettings, genolink_credentials::ApiBase, url::Url};

use crate::error::Result;

/// The provider's two data endpoints, injected at construction.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    production: Url,
    demo: Url,
}

impl ProviderEndpoints {
    pub fn new(production: &str, demo: &str) -> Result<Self> {
        Ok(Self {
            production: parse_base(production)?,
            demo: parse_base(demo)?,
        })
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        Self::new(&settings.production_base, &settings.demo_base)
    }

    fn base(&self, api_base: ApiBase) -> &Url {
        match api_base {
            ApiBase::Production => &self.production,
            ApiBase::Demo => &self.demo,
        }
    }

    /// `<base>/names/`
    pub fn profiles_url(&self, api_base: ApiBase) -> Result<Url> {
        Ok(self.base(api_base).join("names/")?)
    }

    /// `<base>/genotypes/<profile_id>?locations=<ids joined by space>&format=embedded`
    ///
    /// Variant ids are joined as given: no trimming, no deduplication.
    pub fn genotypes_url(
        &self,
        api_base: ApiBase,
        profile_id: &str,
        variant_ids: &[String],
    ) -> Result<Url> {
        let mut url = self.base(api_base).join("genotypes/")?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(profile_id);
        url.query_pairs_mut()
            .append_pair("locations", &variant_ids.join(" "))
            .append_pair("format", "embedded");
        Ok(url)
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins append
/// instead of replacing the last segment.
fn parse_base(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}
