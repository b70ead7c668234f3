use color_eyre::eyre::{Context, Result};
use futures::StreamExt;
use regex::Regex;
use tracing::instrument;

use crate::models::ResolvedTrack;
use crate::ports::spotify::{SpotifyApiTrack, SpotifyClient};

/// Resolves model search queries to Spotify tracks, one result per query.
pub struct TrackResolver {
    concurrency: usize,
    song_by_artist: Regex,
}

impl TrackResolver {
    /// `concurrency` of 1 searches strictly one query at a time.
    pub fn new(concurrency: usize) -> Result<Self> {
        let song_by_artist =
            Regex::new(r"(?i)^(.*?) by (.*)$").wrap_err("Failed to create regex")?;
        Ok(Self {
            concurrency: concurrency.max(1),
            song_by_artist,
        })
    }

    /// Output has the same length and order as `queries`. A failed or empty
    /// search yields a placeholder with an empty `uri` and never affects the
    /// other queries.
    #[instrument(skip_all, fields(queries = queries.len(), concurrency = self.concurrency))]
    pub async fn resolve(
        &self,
        spotify: &dyn SpotifyClient,
        queries: &[String],
    ) -> Vec<ResolvedTrack> {
        let tracks: Vec<ResolvedTrack> = futures::stream::iter(queries)
            .map(|query| self.resolve_one(spotify, query))
            .buffered(self.concurrency)
            .collect()
            .await;

        let found = tracks.iter().filter(|t| t.is_found()).count();
        tracing::info!("Resolved {}/{} queries on spotify", found, tracks.len());
        tracks
    }

    async fn resolve_one(&self, spotify: &dyn SpotifyClient, query: &str) -> ResolvedTrack {
        match spotify.search_track(query).await {
            Ok(Some(track)) => resolved_from_api(track),
            Ok(None) => {
                tracing::debug!("No spotify match for `{}`", query);
                self.placeholder(query)
            }
            Err(e) => {
                tracing::warn!("Spotify search failed for `{}`: {:#}", query, e);
                self.placeholder(query)
            }
        }
    }

    /// Stand-in for a query Spotify couldn't match. "<song> by <artist>" is split
    /// so the entry still reads like a track.
    fn placeholder(&self, query: &str) -> ResolvedTrack {
        let (name, artist) = match self.song_by_artist.captures(query) {
            Some(captures) => (
                captures[1].trim().to_string(),
                captures[2].trim().to_string(),
            ),
            None => (query.to_string(), String::new()),
        };

        ResolvedTrack {
            id: query.to_string(),
            name,
            artist,
            album: String::new(),
            album_art_url: String::new(),
            uri: String::new(),
        }
    }
}

fn resolved_from_api(track: SpotifyApiTrack) -> ResolvedTrack {
    ResolvedTrack {
        id: track.id,
        name: track.name,
        artist: track.artists.join(", "),
        album: track.album_name,
        album_art_url: track.album_art_url.unwrap_or_default(),
        uri: track.uri,
    }
}
