//! Feed parsing shared by the arXiv (Atom) and RSS scrapers.
//!
//! [`parse_feed`] accepts RSS 2.0 `<item>` and Atom `<entry>` elements and
//! returns them in document order. Namespaced tags (`dc:creator`,
//! `arxiv:comment`) are matched on their local name.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::error::ScraperError;

/// One feed item, before source-specific normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: Option<String>,
    pub title: String,
    pub link: Option<String>,
    pub summary: String,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Atom `<link>` carries its target in `href`; only `alternate` (or unlabelled)
/// links point at the human-readable page.
fn apply_link_element(entry: &mut FeedEntry, e: &BytesStart<'_>) {
    let Some(href) = attribute(e, "href") else {
        return;
    };
    let rel = attribute(e, "rel");
    if matches!(rel.as_deref(), None | Some("alternate")) && entry.link.is_none() {
        entry.link = Some(href);
    }
}

fn apply_text(entry: &mut FeedEntry, tag: &str, in_author: bool, text: String) {
    let text = collapse_whitespace(&text);
    if text.is_empty() {
        return;
    }
    match tag {
        "title" => entry.title = text,
        "link" if entry.link.is_none() => entry.link = Some(text),
        "id" | "guid" => entry.id = Some(text),
        "description" | "summary" => entry.summary = strip_html(&text),
        "encoded" | "content" if entry.summary.is_empty() => entry.summary = strip_html(&text),
        "published" | "pubDate" | "date" => entry.published = Some(text),
        "updated" => entry.updated = Some(text),
        "name" if in_author => entry.authors.push(text),
        "creator" | "author" => entry.authors.push(text),
        "category" => entry.categories.push(text),
        _ => {}
    }
}

/// Parse an RSS or Atom document into entries.
///
/// # Errors
///
/// Returns [`ScraperError::Xml`] if the XML is malformed.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, ScraperError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut tag = String::new();
    let mut text = String::new();
    let mut in_author = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                match name.as_str() {
                    "item" | "entry" => current = Some(FeedEntry::default()),
                    "author" => in_author = true,
                    _ => {}
                }
                if let Some(entry) = current.as_mut() {
                    match name.as_str() {
                        "link" => apply_link_element(entry, &e),
                        "category" => {
                            if let Some(term) = attribute(&e, "term") {
                                entry.categories.push(term);
                            }
                        }
                        _ => {}
                    }
                }
                tag = name;
                text.clear();
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    match local_name(&e).as_str() {
                        "link" => apply_link_element(entry, &e),
                        "category" => {
                            if let Some(term) = attribute(&e, "term") {
                                entry.categories.push(term);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(e) => {
                if current.is_some() {
                    text.push_str(&e.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(e) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "item" | "entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    "author" => {
                        // RSS <author> holds text directly; Atom nests <name>
                        if let Some(entry) = current.as_mut() {
                            if tag == "author" {
                                apply_text(entry, "author", false, std::mem::take(&mut text));
                            }
                        }
                        in_author = false;
                    }
                    _ => {
                        if let Some(entry) = current.as_mut() {
                            if name == tag {
                                apply_text(entry, &name, in_author, std::mem::take(&mut text));
                            }
                        }
                    }
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Parse RFC 3339 (Atom) or RFC 2822 (RSS) timestamps.
pub fn parse_feed_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Strip HTML tags and decode entities (`&amp;`, `&#39;`, `&nbsp;`),
/// returning plain text.
pub(crate) fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    collapse_whitespace(&html_escape::decode_html_entities(&result))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Startup News</title>
    <item>
      <title>Acme raises Series A</title>
      <link>https://example.com/acme</link>
      <guid>https://example.com/?p=101</guid>
      <description><![CDATA[<p>Acme closed a <b>$10M</b> round.</p>]]></description>
      <pubDate>Tue, 10 Mar 2026 14:30:00 +0000</pubDate>
      <dc:creator>Jane Doe</dc:creator>
      <category>Funding</category>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/second</link>
    </item>
  </channel>
</rss>"#;

    const SAMPLE_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/2403.01234v2</id>
    <updated>2026-03-05T18:00:00Z</updated>
    <published>2026-03-04T17:59:59Z</published>
    <title>Scaling   Laws for
      Tiny Models</title>
    <summary>  We study small models.  </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <arxiv:comment>12 pages</arxiv:comment>
    <link href="http://arxiv.org/abs/2403.01234v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2403.01234v2" rel="related" type="application/pdf"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items() {
        let entries = parse_feed(SAMPLE_RSS).unwrap();
        assert_eq!(entries.len(), 2);
        let first = &entries[0];
        assert_eq!(first.title, "Acme raises Series A");
        assert_eq!(first.link.as_deref(), Some("https://example.com/acme"));
        assert_eq!(first.id.as_deref(), Some("https://example.com/?p=101"));
        assert_eq!(first.summary, "Acme closed a $10M round.");
        assert_eq!(first.authors, vec!["Jane Doe".to_string()]);
        assert_eq!(first.categories, vec!["Funding".to_string()]);
        assert!(parse_feed_date(first.published.as_deref().unwrap()).is_some());
        assert!(entries[1].id.is_none());
    }

    #[test]
    fn parses_atom_entries() {
        let entries = parse_feed(SAMPLE_ATOM).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.id.as_deref(), Some("http://arxiv.org/abs/2403.01234v2"));
        assert_eq!(entry.title, "Scaling Laws for Tiny Models");
        assert_eq!(entry.summary, "We study small models.");
        assert_eq!(entry.link.as_deref(), Some("http://arxiv.org/abs/2403.01234v2"));
        assert_eq!(entry.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(entry.categories, vec!["cs.LG", "cs.AI"]);
        assert_eq!(entry.published.as_deref(), Some("2026-03-04T17:59:59Z"));
    }

    #[test]
    fn empty_feed_returns_empty_vec() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn mismatched_tags_are_an_error() {
        let xml = "<rss><channel><item><title>Broken</channel></rss>";
        assert!(matches!(parse_feed(xml), Err(ScraperError::Xml(_))));
    }

    #[test]
    fn feed_dates_accept_both_formats() {
        assert!(parse_feed_date("2026-03-04T17:59:59Z").is_some());
        assert!(parse_feed_date("Tue, 10 Mar 2026 14:30:00 +0000").is_some());
        assert!(parse_feed_date("yesterday").is_none());
    }

    #[test]
    fn entities_inside_cdata_are_decoded() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><item>
  <title>Ben &amp; Jerry</title>
  <link>https://example.com/bj</link>
  <description><![CDATA[<p>Founders&#39; notes &amp; lessons&nbsp;learned</p>]]></description>
</item></channel></rss>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries[0].title, "Ben & Jerry");
        assert_eq!(entries[0].summary, "Founders' notes & lessons learned");
    }

    #[test]
    fn escaped_markup_survives_as_text() {
        assert_eq!(strip_html("<b>a &lt;b&gt; tag</b>"), "a <b> tag");
    }
}
