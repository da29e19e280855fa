use crate::model::NewsItem;
use crate::shape::{absolutize, media_url, pick, pick_str, record_id};
use serde_json::Value;

const TITLE_KEYS: &[&str] = &["title", "headline", "name"];
const DATE_KEYS: &[&str] = &["date", "publishedDate", "publishedAt", "createdAt"];
const IMAGE_KEYS: &[&str] = &["image", "coverImage", "cover", "featuredImage", "thumbnail"];
const EXCERPT_KEYS: &[&str] = &["excerpt", "summary", "description"];
const LINK_KEYS: &[&str] = &["url", "link", "externalUrl"];

/// Normalizes a news record. Records without a title are skipped.
pub fn normalize_news_item(record: &Value, origin: &str) -> Option<NewsItem> {
    let title = pick_str(record, TITLE_KEYS)?;
    let slug = pick_str(record, &["slug"]);
    let id = record_id(record)
        .or_else(|| slug.clone())
        .unwrap_or_else(|| title.clone());

    let url = match (pick_str(record, LINK_KEYS), &slug) {
        (Some(link), _) => link,
        (None, Some(slug)) => format!("/news/{slug}"),
        (None, None) => format!("/news/{id}"),
    };

    Some(NewsItem {
        title,
        slug,
        date: pick_str(record, DATE_KEYS),
        image: pick(record, IMAGE_KEYS)
            .and_then(media_url)
            .map(|url| absolutize(origin, &url)),
        url,
        excerpt: pick_str(record, EXCERPT_KEYS),
        id,
    })
}

pub fn normalize_news(records: &[Value], origin: &str) -> Vec<NewsItem> {
    records
        .iter()
        .filter_map(|record| normalize_news_item(record, origin))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_news_shapes() {
        let records = vec![
            json!({"id": 1, "attributes": {
                "title": "Round 1 wrap",
                "slug": "round-1-wrap",
                "publishedAt": "2024-03-01T00:00:00.000Z",
                "coverImage": {"data": {"attributes": {"url": "/uploads/r1.jpg"}}}
            }}),
            json!({"documentId": "x9", "title": "Entries open", "date": "2024-04-01",
                   "image": {"url": "https://cdn.example.com/e.jpg"}, "link": "https://raceready.com.au"}),
            json!({"id": 3, "slug": "untitled"}),
        ];

        let items = normalize_news(&records, "https://cms.example.com/");
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, "1");
        assert_eq!(items[0].url, "/news/round-1-wrap");
        assert_eq!(items[0].date.as_deref(), Some("2024-03-01T00:00:00.000Z"));
        assert_eq!(
            items[0].image.as_deref(),
            Some("https://cms.example.com/uploads/r1.jpg")
        );

        assert_eq!(items[1].id, "x9");
        assert_eq!(items[1].url, "https://raceready.com.au");
        assert_eq!(items[1].image.as_deref(), Some("https://cdn.example.com/e.jpg"));
    }
}
