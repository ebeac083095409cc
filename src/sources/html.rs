//! Selector-based extraction for listing pages without a syndication feed.

use scraper::{Html, Selector};
use url::Url;

use crate::domain::item::Item;
use crate::models::config::FeedConfig;
use crate::sources::rss::resolve_link;
use crate::sources::{FetchError, FetchResult, clean_text};

pub const DEFAULT_ITEM_SELECTOR: &str = ".mlist .item";
pub const DEFAULT_TITLE_SELECTOR: &str = ".title";
pub const DEFAULT_LINK_SELECTOR: &str = "a";

fn parse_selector(raw: &str) -> FetchResult<Selector> {
    Selector::parse(raw).map_err(|_| FetchError::Selector(raw.to_string()))
}

/// Extracts one [`Item`] per listing card.
///
/// Cards lacking either a title element or a link element are skipped.
/// Relative links are resolved against the feed URL.
pub fn extract_items(body: &str, feed: &FeedConfig) -> FetchResult<Vec<Item>> {
    let item_selector =
        parse_selector(feed.item_selector.as_deref().unwrap_or(DEFAULT_ITEM_SELECTOR))?;
    let title_selector =
        parse_selector(feed.title_selector.as_deref().unwrap_or(DEFAULT_TITLE_SELECTOR))?;
    let link_selector =
        parse_selector(feed.link_selector.as_deref().unwrap_or(DEFAULT_LINK_SELECTOR))?;

    let base = Url::parse(&feed.url).ok();
    let document = Html::parse_document(body);

    let items = document
        .select(&item_selector)
        .filter_map(|card| {
            let title = card.select(&title_selector).next()?;
            let href = card.select(&link_selector).next()?.value().attr("href")?;
            Some(Item::new(
                clean_text(&title.text().collect::<String>()),
                resolve_link(base.as_ref(), href),
                feed.name.clone(),
            ))
        })
        .collect::<Vec<_>>();

    if items.is_empty() {
        log::debug!("No items matched on {}", feed.url);
    }

    Ok(items)
}
