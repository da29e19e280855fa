use crate::model::{Block, PageRecord};
use crate::normalize::normalize_path;
use crate::shape::{absolutize, field, media_url, pick, pick_str, record_id, relation, relation_list};
use serde_json::Value;

const TITLE_KEYS: &[&str] = &["title", "name", "heading"];
const BLOCK_LIST_KEYS: &[&str] = &["blocks", "content", "sections"];
const COMPONENT_KEY: &str = "__component";

const HERO_TITLE_KEYS: &[&str] = &["title", "heading"];
const HERO_SUBTITLE_KEYS: &[&str] = &["subtitle", "subheading", "tagline"];
const HERO_IMAGE_KEYS: &[&str] = &["image", "backgroundImage", "background", "media"];
const CTA_LABEL_KEYS: &[&str] = &["ctaLabel", "ctaText", "buttonText", "label", "text"];
const CTA_URL_KEYS: &[&str] = &["ctaUrl", "ctaLink", "buttonLink", "url", "href", "link"];
const RICH_TEXT_KEYS: &[&str] = &["body", "content", "text", "html"];
const CTA_DESCRIPTION_KEYS: &[&str] = &["description", "subtitle"];

const HOME_SLUG: &str = "home";
// Parent chains in the CMS are shallow; this only guards against cycles.
const MAX_PARENT_DEPTH: usize = 8;

/// The page's canonical path: the explicit `path` field when present,
/// otherwise the path computed from the parent chain.
pub fn page_path(record: &Value) -> String {
    match pick_str(record, &["path"]) {
        Some(path) => normalize_path(&path),
        None => candidate_path(record),
    }
}

/// Path derived from the slugs of the record and its parents.
///
/// A root-level page with the slug `home` maps to `/`.
pub fn candidate_path(record: &Value) -> String {
    let mut slugs = Vec::new();
    let mut current = Some(record);

    while let Some(page) = current {
        if slugs.len() >= MAX_PARENT_DEPTH {
            break;
        }
        if let Some(slug) = pick_str(page, &["slug"]) {
            slugs.push(slug);
        }
        current = relation(page, "parent");
    }

    if slugs.len() == 1 && slugs[0] == HOME_SLUG {
        return "/".to_string();
    }

    slugs.reverse();
    normalize_path(&slugs.join("/"))
}

/// Picks the record whose computed path equals `path`. The root path also
/// accepts a `home` slug.
pub fn find_by_candidate<'a>(records: &'a [Value], path: &str) -> Option<&'a Value> {
    let path = normalize_path(path);
    records.iter().find(|record| {
        candidate_path(record) == path
            || (path == "/" && pick_str(record, &["slug"]).as_deref() == Some(HOME_SLUG))
    })
}

/// Last path segment, used as the slug filter for the candidate scan.
pub fn last_segment(path: &str) -> Option<&str> {
    path.rsplit('/').find(|segment| !segment.is_empty())
}

pub fn normalize_page(record: &Value, origin: &str) -> PageRecord {
    let path = page_path(record);
    let slug = pick_str(record, &["slug"]);
    let title = pick_str(record, TITLE_KEYS)
        .or_else(|| slug.clone())
        .unwrap_or_default();

    let blocks = BLOCK_LIST_KEYS
        .iter()
        .map(|key| relation_list(record, key))
        .find(|list| !list.is_empty())
        .unwrap_or_default()
        .iter()
        .map(|block| normalize_block(block, origin))
        .collect();

    PageRecord {
        id: record_id(record),
        path,
        title,
        slug,
        blocks,
    }
}

/// Maps a dynamic-zone component onto [`Block`].
///
/// Matching is on the component name suffix, so `blocks.hero` and
/// `shared.hero` are both heroes.
pub fn normalize_block(value: &Value, origin: &str) -> Block {
    let component = field(value, COMPONENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string);
    let kind = component
        .as_deref()
        .and_then(|c| c.rsplit('.').next())
        .unwrap_or_default();

    match kind {
        "hero" => Block::Hero {
            title: pick_str(value, HERO_TITLE_KEYS),
            subtitle: pick_str(value, HERO_SUBTITLE_KEYS),
            image: pick(value, HERO_IMAGE_KEYS)
                .and_then(media_url)
                .map(|url| absolutize(origin, &url)),
            cta_label: pick_str(value, CTA_LABEL_KEYS),
            cta_url: pick_str(value, CTA_URL_KEYS),
        },
        "rich-text" | "rich_text" | "richtext" => Block::RichText {
            body: pick_str(value, RICH_TEXT_KEYS).unwrap_or_default(),
        },
        "cta" => match (pick_str(value, CTA_LABEL_KEYS), pick_str(value, CTA_URL_KEYS)) {
            (Some(label), Some(url)) => Block::Cta {
                label,
                url,
                description: pick_str(value, CTA_DESCRIPTION_KEYS),
            },
            _ => unknown(component, value),
        },
        _ => unknown(component, value),
    }
}

fn unknown(component: Option<String>, value: &Value) -> Block {
    Block::Unknown {
        component,
        data: value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORIGIN: &str = "https://cms.example.com";

    #[test]
    fn test_candidate_path_from_parent_chain() {
        let record = json!({
            "slug": "results",
            "parent": {"data": {"attributes": {
                "slug": "2024",
                "parent": {"data": {"attributes": {"slug": "events"}}}
            }}}
        });
        assert_eq!(candidate_path(&record), "/events/2024/results");
        assert_eq!(page_path(&record), "/events/2024/results");

        let explicit = json!({"slug": "ignored", "path": "events//calendar/"});
        assert_eq!(page_path(&explicit), "/events/calendar");

        assert_eq!(candidate_path(&json!({"slug": "home"})), "/");
    }

    #[test]
    fn test_find_by_candidate() {
        let records = vec![
            json!({"id": 1, "slug": "results", "parent": {"slug": "club"}}),
            json!({"id": 2, "slug": "results", "parent": {"slug": "events"}}),
            json!({"id": 3, "slug": "home", "parent": null}),
        ];
        let found = find_by_candidate(&records, "/events/results/").unwrap();
        assert_eq!(found["id"], json!(2));

        let home = find_by_candidate(&records, "").unwrap();
        assert_eq!(home["id"], json!(3));

        assert!(find_by_candidate(&records, "/results").is_none());
        assert_eq!(last_segment("/events/results/"), Some("results"));
        assert_eq!(last_segment("/"), None);
    }

    #[test]
    fn test_blocks() {
        let record = json!({
            "id": 9,
            "attributes": {
                "title": "Events",
                "path": "/events",
                "blocks": [
                    {"__component": "blocks.hero", "heading": "Round 3", "image": {"data": {"attributes": {"url": "/uploads/hero.jpg"}}}},
                    {"__component": "shared.rich-text", "body": "<p>Entries open</p>"},
                    {"__component": "blocks.cta", "label": "Enter", "url": "https://raceready.com.au"},
                    {"__component": "blocks.cta", "label": "Missing url"},
                    {"__component": "blocks.gallery", "images": []}
                ]
            }
        });

        let page = normalize_page(&record, ORIGIN);
        assert_eq!(page.path, "/events");
        assert_eq!(page.title, "Events");
        assert_eq!(page.id.as_deref(), Some("9"));
        assert_eq!(page.blocks.len(), 5);
        assert_eq!(
            page.blocks[0],
            Block::Hero {
                title: Some("Round 3".into()),
                subtitle: None,
                image: Some("https://cms.example.com/uploads/hero.jpg".into()),
                cta_label: None,
                cta_url: None,
            }
        );
        assert!(matches!(page.blocks[1], Block::RichText { .. }));
        assert!(matches!(page.blocks[2], Block::Cta { .. }));
        assert!(matches!(&page.blocks[3], Block::Unknown { component: Some(c), .. } if c == "blocks.cta"));
        assert!(matches!(&page.blocks[4], Block::Unknown { component: Some(c), .. } if c == "blocks.gallery"));
    }
}
