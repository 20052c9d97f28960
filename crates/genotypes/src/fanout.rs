use std::collections::BTreeMap;

use {
    futures::{StreamExt, stream},
    genolink_credentials::ApiBase,
    secrecy::Secret,
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::{
    api::ProviderApi,
    error::{ApiFailure, Error, Result},
};

/// profile id → (variant id → genotype call, e.g. `"AG"`).
pub type GenotypeMap = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Deserialize)]
struct GenotypeResponse {
    id: String,
    genotypes: BTreeMap<String, String>,
}

impl ProviderApi {
    /// Fetch `variant_ids` for every profile in `profile_ids`, one request per
    /// profile, at most `max_in_flight` at a time.
    ///
    /// Waits for every request. If any of them failed the whole query fails
    /// with all failures attached; a partial map is never returned.
    pub async fn query_genotypes(
        &self,
        access_token: &Secret<String>,
        api_base: ApiBase,
        variant_ids: &[String],
        profile_ids: &[String],
    ) -> Result<GenotypeMap> {
        if variant_ids.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let urls = profile_ids
            .iter()
            .map(|pid| self.endpoints().genotypes_url(api_base, pid, variant_ids))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            %api_base,
            profiles = urls.len(),
            variants = variant_ids.len(),
            "genotype fan-out"
        );

        let responses: Vec<std::result::Result<GenotypeResponse, ApiFailure>> =
            stream::iter(urls)
                .map(|url| self.get_json::<GenotypeResponse>(url, access_token))
                .buffer_unordered(self.max_in_flight())
                .collect()
                .await;

        let mut genotypes = GenotypeMap::new();
        let mut failures = Vec::new();
        for response in responses {
            match response {
                Ok(r) => {
                    genotypes.insert(r.id, r.genotypes);
                },
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                total = profile_ids.len(),
                "genotype fan-out failed"
            );
            failures.sort_by(|a, b| a.url.cmp(&b.url));
            return Err(Error::ApiCall { failures });
        }

        Ok(genotypes)
    }
}
