use crate::model::{ColorTokens, FooterColors, Hero, SiteConfig, SocialLink, Sponsor};
use crate::normalize::menu::normalize_menu_items;
use crate::normalize::normalize_documents;
use crate::shape::{absolutize, media_url, pick, pick_str, relation, relation_list};
use serde_json::Value;

const TITLE_KEYS: &[&str] = &["title", "name", "siteName", "siteTitle"];
const LOGO_KEYS: &[&str] = &["logo", "logoUrl", "siteLogo"];
const COLOR_GROUP_KEYS: &[&str] = &["colors", "theme", "palette"];
const GUID_KEYS: &[&str] = &[
    "raceReadyGUID",
    "raceReadyGuid",
    "raceready_guid",
    "raceReadyId",
    "race_ready_guid",
];

const PRIMARY_KEYS: &[&str] = &["primary", "primaryColor", "primary_color"];
const SECONDARY_KEYS: &[&str] = &["secondary", "secondaryColor", "secondary_color"];
const ACCENT_KEYS: &[&str] = &["accent", "accentColor", "accent_color"];
const BACKGROUND_KEYS: &[&str] = &["background", "backgroundColor", "background_color"];
const TEXT_KEYS: &[&str] = &["text", "textColor", "text_color"];
const FOOTER_BACKGROUND_KEYS: &[&str] = &["footerBackground", "footerBg", "footer_background"];
const FOOTER_TEXT_KEYS: &[&str] = &["footerText", "footerTextColor", "footer_text"];

const HERO_KEYS: &[&str] = &["hero", "heroSection", "banner"];
const HERO_TITLE_KEYS: &[&str] = &["title", "heading"];
const HERO_SUBTITLE_KEYS: &[&str] = &["subtitle", "subheading", "tagline"];
const HERO_IMAGE_KEYS: &[&str] = &["image", "backgroundImage", "background"];
const HERO_CTA_LABEL_KEYS: &[&str] = &["ctaLabel", "ctaText", "buttonText"];
const HERO_CTA_URL_KEYS: &[&str] = &["ctaUrl", "ctaLink", "buttonLink"];
const HERO_DATE_KEYS: &[&str] = &["eventDate", "countdownDate", "date"];

const SPONSOR_NAME_KEYS: &[&str] = &["name", "title"];
const SPONSOR_LOGO_KEYS: &[&str] = &["logo", "image"];
const SPONSOR_URL_KEYS: &[&str] = &["url", "website", "link"];

const SOCIAL_KEYS: &[&str] = &["social", "socialLinks", "socials"];
const SOCIAL_PLATFORM_KEYS: &[&str] = &["platform", "name", "type"];
const SOCIAL_URL_KEYS: &[&str] = &["url", "link", "href"];

/// Normalizes a `sites` record into [`SiteConfig`]. Media URLs are made
/// absolute against the CMS origin.
pub fn normalize_site(record: &Value, origin: &str) -> SiteConfig {
    let menu = normalize_menu_items(relation_list(record, "menu"));
    let colors_source = pick(record, COLOR_GROUP_KEYS).unwrap_or(record);

    SiteConfig {
        slug: pick_str(record, &["slug"]),
        domain: pick_str(record, &["domain"]),
        title: pick_str(record, TITLE_KEYS).unwrap_or_default(),
        logo: media(record, LOGO_KEYS, origin),
        colors: ColorTokens {
            primary: pick_str(colors_source, PRIMARY_KEYS),
            secondary: pick_str(colors_source, SECONDARY_KEYS),
            accent: pick_str(colors_source, ACCENT_KEYS),
            background: pick_str(colors_source, BACKGROUND_KEYS),
            text: pick_str(colors_source, TEXT_KEYS),
        },
        footer: footer(record),
        menu,
        hero: hero(record, origin),
        sponsors: relation_list(record, "sponsors")
            .iter()
            .filter_map(|sponsor| normalize_sponsor(sponsor, origin))
            .collect(),
        social: pick(record, SOCIAL_KEYS).map(social_links).unwrap_or_default(),
        documents: normalize_documents(relation_list(record, "documents"), Some(origin)),
        race_ready_guid: pick_str(record, GUID_KEYS),
    }
}

fn media(record: &Value, keys: &[&str], origin: &str) -> Option<String> {
    pick(record, keys)
        .and_then(media_url)
        .map(|url| absolutize(origin, &url))
}

fn footer(record: &Value) -> FooterColors {
    match relation(record, "footer") {
        Some(group) => FooterColors {
            background: pick_str(group, BACKGROUND_KEYS),
            text: pick_str(group, TEXT_KEYS),
        },
        None => FooterColors {
            background: pick_str(record, FOOTER_BACKGROUND_KEYS),
            text: pick_str(record, FOOTER_TEXT_KEYS),
        },
    }
}

fn hero(record: &Value, origin: &str) -> Option<Hero> {
    let source = HERO_KEYS.iter().find_map(|key| relation(record, key))?;
    let hero = Hero {
        title: pick_str(source, HERO_TITLE_KEYS),
        subtitle: pick_str(source, HERO_SUBTITLE_KEYS),
        image: media(source, HERO_IMAGE_KEYS, origin),
        cta_label: pick_str(source, HERO_CTA_LABEL_KEYS),
        cta_url: pick_str(source, HERO_CTA_URL_KEYS),
        event_date: pick_str(source, HERO_DATE_KEYS),
    };
    (hero != Hero::default()).then_some(hero)
}

fn normalize_sponsor(value: &Value, origin: &str) -> Option<Sponsor> {
    let logo = media(value, SPONSOR_LOGO_KEYS, origin);
    let name = pick_str(value, SPONSOR_NAME_KEYS);
    if name.is_none() && logo.is_none() {
        return None;
    }
    Some(Sponsor {
        name: name.unwrap_or_default(),
        logo,
        url: pick_str(value, SPONSOR_URL_KEYS),
    })
}

/// Social links arrive as a list of `{platform, url}` or as a map from
/// platform to URL.
fn social_links(value: &Value) -> Vec<SocialLink> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                Some(SocialLink {
                    platform: pick_str(item, SOCIAL_PLATFORM_KEYS)?,
                    url: pick_str(item, SOCIAL_URL_KEYS)?,
                })
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "id" | "__component"))
            .filter_map(|(platform, url)| {
                let url = url.as_str().filter(|u| !u.trim().is_empty())?;
                Some(SocialLink {
                    platform: platform.clone(),
                    url: url.trim().to_string(),
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORIGIN: &str = "https://cms.example.com";

    #[test]
    fn test_strapi_v4_site() {
        let record = json!({
            "id": 1,
            "attributes": {
                "slug": "mra",
                "title": "Motor Racing Australia",
                "raceReadyGuid": "guid-123",
                "logo": {"data": {"attributes": {"url": "/uploads/logo.svg"}}},
                "colors": {"primaryColor": "#d00", "text": "#fff"},
                "footer": {"backgroundColor": "#111"},
                "hero": {"heading": "Winton Festival", "eventDate": "2024-05-04"},
                "sponsors": {"data": [
                    {"id": 1, "attributes": {"name": "Tyres Co", "logo": {"data": {"attributes": {"url": "/uploads/t.png"}}}}},
                    {"id": 2, "attributes": {}}
                ]},
                "social": {"facebook": "https://facebook.com/mra", "instagram": "", "id": 4},
                "menu": [{"label": "Events", "url": "/events"}]
            }
        });

        let site = normalize_site(&record, ORIGIN);
        assert_eq!(site.slug.as_deref(), Some("mra"));
        assert_eq!(site.title, "Motor Racing Australia");
        assert_eq!(site.race_ready_guid.as_deref(), Some("guid-123"));
        assert_eq!(site.logo.as_deref(), Some("https://cms.example.com/uploads/logo.svg"));
        assert_eq!(site.colors.primary.as_deref(), Some("#d00"));
        assert_eq!(site.footer.background.as_deref(), Some("#111"));
        assert_eq!(site.hero.as_ref().and_then(|h| h.title.as_deref()), Some("Winton Festival"));
        assert_eq!(site.sponsors.len(), 1);
        assert_eq!(site.sponsors[0].logo.as_deref(), Some("https://cms.example.com/uploads/t.png"));
        assert_eq!(
            site.social,
            vec![SocialLink {
                platform: "facebook".into(),
                url: "https://facebook.com/mra".into()
            }]
        );
        assert_eq!(site.menu.len(), 1);
    }

    #[test]
    fn test_flat_site_with_top_level_colors() {
        let record = json!({
            "documentId": "s1",
            "slug": "hrc",
            "name": "Historic Racing Club",
            "primaryColor": "#004",
            "footerBackground": "#000",
            "socialLinks": [{"platform": "youtube", "url": "https://youtube.com/hrc"}],
            "menu": [],
            "hero": null
        });

        let site = normalize_site(&record, ORIGIN);
        assert_eq!(site.title, "Historic Racing Club");
        assert_eq!(site.colors.primary.as_deref(), Some("#004"));
        assert_eq!(site.footer.background.as_deref(), Some("#000"));
        assert_eq!(site.social.len(), 1);
        assert!(site.hero.is_none());
        assert!(site.menu.is_empty());
        assert_eq!(site.race_ready_guid, None);
    }
}
