use std::fmt;

use url::Url;

use crate::error::ExtractionError;

const ID_LEN: usize = 11;
const YOUTUBE_HOSTS: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

/// A validated YouTube video id.
///
/// Accepted inputs:
/// - https://www.youtube.com/watch?v=VIDEO_ID
/// - https://youtu.be/VIDEO_ID
/// - https://youtube.com/{embed,shorts,v,live}/VIDEO_ID
/// - a bare 11-character id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoReference {
    id: String,
}

impl VideoReference {
    pub fn parse(input: &str) -> Result<Self, ExtractionError> {
        let input = input.trim();
        let invalid = |reason: &str| ExtractionError::InvalidReference {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if is_valid_id(input) {
            return Ok(Self {
                id: input.to_string(),
            });
        }

        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{input}")
        };
        let url = Url::parse(&with_scheme).map_err(|_| invalid("not a URL"))?;
        let host = url.host_str().ok_or_else(|| invalid("URL has no host"))?;

        let candidate = if host == "youtu.be" || host == "www.youtu.be" {
            first_segment(&url)
        } else if YOUTUBE_HOSTS.contains(&host) {
            id_from_youtube_path(&url)
        } else {
            return Err(invalid("not a YouTube host"));
        };

        let id = candidate.ok_or_else(|| invalid("no video id in URL"))?;
        if !is_valid_id(&id) {
            return Err(invalid("malformed video id"));
        }
        Ok(Self { id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn canonical_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

fn id_from_youtube_path(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    match segments.next()? {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "embed" | "shorts" | "v" | "live" => segments.next().map(str::to_string),
        _ => None,
    }
}

fn first_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_valid_id(s: &str) -> bool {
    s.len() == ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_supported_url_shapes() {
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&list=PLrAXtmRdnEQy4qtr",
            "http://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=30",
            "youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
            "  dQw4w9WgXcQ  ",
        ] {
            let reference = VideoReference::parse(input).unwrap_or_else(|e| panic!("{input}: {e}"));
            assert_eq!(reference.id(), ID);
        }
    }

    #[test]
    fn test_canonical_url() {
        let reference = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(
            reference.canonical_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_rejected_inputs() {
        for input in [
            "",
            "not a url",
            "https://vimeo.com/123456789",
            "https://notyoutube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/watch?list=PL123",
            "https://www.youtube.com/channel/UC1234567890",
            "https://youtu.be/",
            "https://youtube.com/watch?v=dQw4w9WgX!Q",
        ] {
            let err = VideoReference::parse(input).unwrap_err();
            assert!(
                matches!(err, ExtractionError::InvalidReference { .. }),
                "{input}"
            );
        }
    }
}
