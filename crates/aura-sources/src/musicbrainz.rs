//! Metadata resolution through MusicBrainz.
//!
//! Resolves an artist name to its MusicBrainz id and, through the artist's
//! URL relations, its Discogs id. Resolution never fails outright: any
//! network error, rate limit or identity mismatch degrades to a partial or
//! empty [`MetadataResult`].

use async_trait::async_trait;
use aura_core::{Error, MetadataResult, Result};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::{ProxyClient, RateLimitPolicy, RateLimiter};

/// Something that can resolve an artist's canonical identifiers.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Resolve `name`, skipping the search when `known_mbid` is given.
    async fn resolve(&self, name: &str, known_mbid: Option<&str>) -> MetadataResult;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    artists: Vec<SearchArtist>,
}

#[derive(Debug, Deserialize)]
struct SearchArtist {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    relations: Vec<Relation>,
}

#[derive(Debug, Deserialize)]
struct Relation {
    #[serde(rename = "type")]
    kind: String,
    url: Option<RelationUrl>,
}

#[derive(Debug, Deserialize)]
struct RelationUrl {
    resource: String,
}

/// The two MusicBrainz calls resolution needs.
#[async_trait]
trait MusicBrainzApi: Send + Sync {
    async fn search(&self, name: &str) -> Result<Vec<SearchArtist>>;

    async fn relations(&self, mbid: &str) -> Result<Vec<Relation>>;
}

/// MusicBrainz through the proxy, behind its own adaptive rate limiter.
struct ProxyApi {
    client: ProxyClient,
    limiter: RateLimiter,
}

#[async_trait]
impl MusicBrainzApi for ProxyApi {
    async fn search(&self, name: &str) -> Result<Vec<SearchArtist>> {
        let query = [("artist", name)];
        let response: SearchResponse = self
            .limiter
            .call(|| self.client.get_json("api/musicbrainz/search", &query))
            .await?;
        Ok(response.artists)
    }

    async fn relations(&self, mbid: &str) -> Result<Vec<Relation>> {
        let path = format!("api/musicbrainz/artist/{mbid}");
        let response: LookupResponse = self
            .limiter
            .call(|| self.client.get_json(&path, &[]))
            .await?;
        Ok(response.relations)
    }
}

/// Resolves artist names to MusicBrainz and Discogs ids.
pub struct MusicBrainzResolver {
    api: Box<dyn MusicBrainzApi>,
}

impl MusicBrainzResolver {
    pub fn new(client: ProxyClient) -> Self {
        Self {
            api: Box::new(ProxyApi {
                client,
                limiter: RateLimiter::new(RateLimitPolicy::MUSICBRAINZ),
            }),
        }
    }

    /// Search by name and verify the top hit is the same artist.
    pub async fn search(&self, name: &str) -> Result<Option<String>> {
        let Some(hit) = self.api.search(name).await?.into_iter().next() else {
            return Ok(None);
        };
        if !same_artist(name, &hit.name) {
            return Err(Error::IdentityMismatch {
                query: name.to_string(),
                found: hit.name,
            });
        }
        Ok(Some(hit.id))
    }

    /// Fetch the artist's relations and pull out a Discogs id.
    pub async fn discogs_id(&self, mbid: &str) -> Result<Option<String>> {
        let relations = self.api.relations(mbid).await?;
        Ok(discogs_id_from_relations(&relations))
    }
}

#[async_trait]
impl MetadataSource for MusicBrainzResolver {
    async fn resolve(&self, name: &str, known_mbid: Option<&str>) -> MetadataResult {
        let mbid = match known_mbid.filter(|id| !id.trim().is_empty()) {
            Some(id) => id.to_string(),
            None => match self.search(name).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    debug!(artist = name, "No MusicBrainz match");
                    return MetadataResult::empty();
                }
                Err(e @ Error::IdentityMismatch { .. }) => {
                    warn!(artist = name, "Rejected MusicBrainz result: {e}");
                    return MetadataResult::empty();
                }
                Err(e) => {
                    debug!(artist = name, "MusicBrainz search failed: {e}");
                    return MetadataResult::empty();
                }
            },
        };

        let discogs_id = match self.discogs_id(&mbid).await {
            Ok(id) => id,
            Err(e) => {
                debug!(artist = name, "MusicBrainz lookup failed: {e}");
                None
            }
        };

        MetadataResult {
            mbid: Some(mbid),
            discogs_id,
        }
    }
}

fn same_artist(query: &str, found: &str) -> bool {
    query.trim().to_lowercase() == found.trim().to_lowercase()
}

/// First Discogs artist id found in a set of URL relations.
fn discogs_id_from_relations(relations: &[Relation]) -> Option<String> {
    relations
        .iter()
        .filter(|r| r.kind.eq_ignore_ascii_case("discogs"))
        .filter_map(|r| r.url.as_ref())
        .find_map(|u| discogs_artist_id(&u.resource))
}

/// Extract the numeric id from `https://www.discogs.com/artist/<id>[-Name]`.
fn discogs_artist_id(resource: &str) -> Option<String> {
    let url = Url::parse(resource).ok()?;
    if !url.host_str()?.ends_with("discogs.com") {
        return None;
    }
    let mut segments = url.path_segments()?;
    if segments.next()? != "artist" {
        return None;
    }
    let id: String = segments
        .next()?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    (!id.is_empty()).then_some(id)
}
