use feed_rs::parser;

use super::fetcher::FetchError;

/// A single link carried by a feed entry, in document order.
#[derive(Debug, Clone)]
pub struct EntryLink {
    pub rel: Option<String>,
    pub href: String,
    pub media_type: Option<String>,
}

impl EntryLink {
    /// An enclosure is the entry's attached downloadable media link.
    pub fn is_enclosure(&self) -> bool {
        self.rel.as_deref() == Some("enclosure") && !self.href.is_empty()
    }
}

/// One feed entry: the raw title plus its links.
///
/// The raw title is the history key; sanitization for filenames happens in
/// the pipeline, not here.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    pub links: Vec<EntryLink>,
}

/// Parse an RSS/Atom document into its entry list, preserving feed order
/// (newest first in virtually every real feed).
///
/// Atom enclosures arrive as links with `rel="enclosure"`. RSS `<enclosure>`
/// elements surface through feed-rs's media model instead, so they are
/// folded back into the link list here — selection downstream only has to
/// know one shape.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<FeedEntry>, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            let mut links: Vec<EntryLink> = entry
                .links
                .into_iter()
                .map(|l| EntryLink {
                    rel: l.rel,
                    href: l.href,
                    media_type: l.media_type,
                })
                .collect();

            for media in entry.media {
                for content in media.content {
                    if let Some(url) = content.url {
                        links.push(EntryLink {
                            rel: Some("enclosure".to_string()),
                            href: url.to_string(),
                            media_type: content.content_type.map(|m| m.essence().to_string()),
                        });
                    }
                }
            }

            FeedEntry { title, links }
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_WITH_ENCLOSURES: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Cast</title>
    <item>
        <title>Episode 2</title>
        <link>https://example.com/ep2</link>
        <enclosure url="https://example.com/ep2.mp3" type="audio/mpeg" length="123"/>
    </item>
    <item>
        <title>Episode 1</title>
        <link>https://example.com/ep1</link>
        <enclosure url="https://example.com/ep1.mp3" type="audio/mpeg" length="456"/>
    </item>
</channel></rss>"#;

    #[test]
    fn test_rss_enclosures_become_links() {
        let entries = parse_entries(RSS_WITH_ENCLOSURES.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        // Feed order preserved: newest first
        assert_eq!(entries[0].title, "Episode 2");
        assert_eq!(entries[1].title, "Episode 1");

        let enclosure = entries[0]
            .links
            .iter()
            .find(|l| l.is_enclosure())
            .expect("enclosure link");
        assert_eq!(enclosure.href, "https://example.com/ep2.mp3");
        assert_eq!(enclosure.media_type.as_deref(), Some("audio/mpeg"));
    }

    #[test]
    fn test_atom_enclosure_link_rel_preserved() {
        let atom = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Test Cast</title>
    <id>urn:feed</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <entry>
        <title>Episode 1</title>
        <id>urn:ep1</id>
        <updated>2024-01-01T00:00:00Z</updated>
        <link rel="alternate" href="https://example.com/ep1"/>
        <link rel="enclosure" href="https://example.com/ep1.ogg" type="audio/ogg"/>
    </entry>
</feed>"#;
        let entries = parse_entries(atom.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);

        let enclosure = entries[0]
            .links
            .iter()
            .find(|l| l.is_enclosure())
            .expect("enclosure link");
        assert_eq!(enclosure.href, "https://example.com/ep1.ogg");
    }

    #[test]
    fn test_entry_without_enclosure() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>Blog post</title><link>https://example.com/post</link></item>
</channel></rss>"#;
        let entries = parse_entries(rss.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].links.iter().any(|l| l.is_enclosure()));
    }

    #[test]
    fn test_missing_title_defaults() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><link>https://example.com/mystery</link></item>
</channel></rss>"#;
        let entries = parse_entries(rss.as_bytes()).unwrap();
        assert_eq!(entries[0].title, "Untitled");
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let result = parse_entries(b"<not valid xml");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_empty_channel() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let entries = parse_entries(rss.as_bytes()).unwrap();
        assert!(entries.is_empty());
    }
}
