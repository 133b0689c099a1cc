use async_trait::async_trait;
use log::{debug, warn};

use super::{MediaResolver, ParsedVideoSource, Resolution, SourceType, StreamVariant, VideoMetadata};
use crate::classify::{StreamProtocol, VIDEO_EXTENSIONS, matching_extension, stream_protocol};
use crate::error::ResolveResult;

/// A resolver for direct file links and raw stream manifests
pub struct DirectVideoResolver {
    client: reqwest::Client,
    probe_variants: bool,
}

impl Default for DirectVideoResolver {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), false)
    }
}

impl DirectVideoResolver {
    /// Create a new direct resolver. With `probe_variants`, HLS master
    /// playlists are downloaded during `resolve` to list their renditions.
    pub fn new(client: reqwest::Client, probe_variants: bool) -> Self {
        Self {
            client,
            probe_variants,
        }
    }

    async fn fetch_variants(&self, url: &str) -> ResolveResult<Vec<StreamVariant>> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_hls_master(url, &body))
    }
}

#[async_trait]
impl MediaResolver for DirectVideoResolver {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn can_resolve(&self, url: &str) -> bool {
        stream_protocol(url).is_some() || matching_extension(url, VIDEO_EXTENSIONS).is_some()
    }

    async fn resolve(&self, url: &str) -> ResolveResult<ParsedVideoSource> {
        let url = url.trim();

        // Protocol decides the type before the file extension does
        let source = match stream_protocol(url) {
            Some(StreamProtocol::Hls) => ParsedVideoSource::new(url, SourceType::Hls)?.with_format("m3u8"),
            Some(StreamProtocol::Dash) => ParsedVideoSource::new(url, SourceType::Dash)?.with_format("mpd"),
            Some(StreamProtocol::Rtmp) => ParsedVideoSource::new(url, SourceType::Rtmp)?.with_format("rtmp"),
            None => {
                let source = ParsedVideoSource::new(url, SourceType::Direct)?;
                match matching_extension(url, VIDEO_EXTENSIONS) {
                    Some(ext) => source.with_format(ext),
                    None => source,
                }
            }
        };

        if self.probe_variants && source.source_type == SourceType::Hls {
            match self.fetch_variants(&source.url).await {
                Ok(variants) => {
                    debug!("Found {} HLS variants for {}", variants.len(), source.url);
                    return Ok(source.with_variants(variants));
                }
                Err(e) => warn!("Could not read HLS playlist {}: {}", source.url, e),
            }
        }

        Ok(source)
    }

    async fn fetch_metadata(&self, url: &str) -> ResolveResult<VideoMetadata> {
        Ok(VideoMetadata {
            title: title_from_path(url),
            ..Default::default()
        })
    }
}

/// File name without extension, e.g. `Big_Buck_Bunny` for `.../Big_Buck_Bunny.mp4?x=1`
fn title_from_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url.trim()).ok()?;
    let file = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Parse the `#EXT-X-STREAM-INF` entries of an HLS master playlist.
/// Relative variant URIs are resolved against `base_url`.
pub fn parse_hls_master(base_url: &str, body: &str) -> Vec<StreamVariant> {
    let base = url::Url::parse(base_url).ok();
    let mut variants = Vec::new();
    let mut pending: Option<Vec<(String, String)>> = None;

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(attrs) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            pending = Some(parse_attributes(attrs));
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let Some(attrs) = pending.take() else {
            continue;
        };

        let url = match &base {
            Some(base) => match base.join(line) {
                Ok(joined) => joined.to_string(),
                Err(_) => continue,
            },
            None => line.to_string(),
        };

        let lookup = |key: &str| attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let bandwidth = lookup("BANDWIDTH").and_then(|v| v.parse::<u64>().ok());
        let resolution = lookup("RESOLUTION").and_then(|v| {
            let (w, h) = v.split_once('x')?;
            Some(Resolution {
                width: w.parse().ok()?,
                height: h.parse().ok()?,
            })
        });
        let quality = match (resolution, bandwidth) {
            (Some(r), _) => format!("{}p", r.height),
            (None, Some(bw)) => format!("{}k", bw / 1000),
            (None, None) => format!("variant {}", variants.len() + 1),
        };

        variants.push(StreamVariant {
            quality,
            url,
            bandwidth,
            resolution,
            codec: lookup("CODECS").map(str::to_string),
        });
    }

    variants
}

/// Split `KEY=value,KEY="quoted,value"` attribute lists
fn parse_attributes(input: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let Some((key, after)) = rest.split_once('=') else {
            break;
        };
        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.split_once('"') {
                Some((value, remaining)) => (value, remaining.trim_start_matches(',')),
                None => (quoted, ""),
            }
        } else {
            match after.split_once(',') {
                Some((value, remaining)) => (value, remaining),
                None => (after, ""),
            }
        };
        attrs.push((key.trim().to_string(), value.to_string()));
        rest = remaining;
    }

    attrs
}
