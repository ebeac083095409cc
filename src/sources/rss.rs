//! Syndication feed adapter covering RSS 2.0, RSS 1.0 (RDF) and Atom.

use html_escape::decode_html_entities;
use quick_xml::Reader;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use serde::Deserialize;
use url::Url;

use crate::domain::item::Item;
use crate::models::config::FeedConfig;
use crate::sources::{FetchError, FetchResult, clean_text};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// The `alternate` link, or the first link when none is marked.
    fn link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .and_then(|l| l.href.as_deref())
    }
}

/// Parses an RSS or Atom document into items attributed to `feed`.
pub fn parse_feed(body: &str, feed: &FeedConfig) -> FetchResult<Vec<Item>> {
    let xml = scrub_html_entities_for_xml(body);
    let parse_error = |reason: String| FetchError::Parse {
        url: feed.url.clone(),
        reason,
    };

    let raw: Vec<(Option<String>, Option<String>)> = match root_element(&xml).as_deref() {
        Some("rss") => {
            let rss: Rss = from_str(&xml).map_err(|e| parse_error(e.to_string()))?;
            rss.channel
                .items
                .into_iter()
                .map(|it| (it.title, it.link))
                .collect()
        }
        Some("RDF") => {
            let rdf: Rdf = from_str(&xml).map_err(|e| parse_error(e.to_string()))?;
            rdf.items.into_iter().map(|it| (it.title, it.link)).collect()
        }
        Some("feed") => {
            let atom: AtomFeed = from_str(&xml).map_err(|e| parse_error(e.to_string()))?;
            atom.entries
                .into_iter()
                .map(|entry| {
                    let link = entry.link().map(str::to_string);
                    (entry.title.map(|t| t.value), link)
                })
                .collect()
        }
        Some(other) => return Err(parse_error(format!("unsupported root element <{other}>"))),
        None => return Err(parse_error("no root element".to_string())),
    };

    let base = Url::parse(&feed.url).ok();
    let items = raw
        .into_iter()
        .filter_map(|(title, link)| {
            let title = clean_text(&decode_html_entities(title.as_deref().unwrap_or_default()));
            let link = resolve_link(base.as_ref(), link.as_deref().unwrap_or_default());
            if title.is_empty() && link.is_empty() {
                return None;
            }
            Some(Item::new(title, link, feed.name.clone()))
        })
        .collect();

    Ok(items)
}

/// Local name of the first element in the document.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

pub(crate) fn resolve_link(base: Option<&Url>, link: &str) -> String {
    let link = link.trim();
    if link.is_empty() {
        return String::new();
    }
    match base.and_then(|b| b.join(link).ok()) {
        Some(url) => url.to_string(),
        None => link.to_string(),
    }
}

/// Replaces HTML-only named entities that an XML parser rejects.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
