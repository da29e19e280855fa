//! Internal record shapes handed to route handlers.
//!
//! Field names serialize in camelCase to match what the site front ends
//! already consume.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    pub slug: Option<String>,
    pub domain: Option<String>,
    pub title: String,
    pub logo: Option<String>,
    pub colors: ColorTokens,
    pub footer: FooterColors,
    pub menu: Vec<MenuItem>,
    pub hero: Option<Hero>,
    pub sponsors: Vec<Sponsor>,
    pub social: Vec<SocialLink>,
    pub documents: Vec<DocumentLink>,
    #[serde(rename = "raceReadyGUID")]
    pub race_ready_guid: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorTokens {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    pub background: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterColors {
    pub background: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    pub event_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sponsor {
    pub name: String,
    pub logo: Option<String>,
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentLink {
    pub id: String,
    pub label: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageRecord {
    pub id: Option<String>,
    pub path: String,
    pub title: String,
    pub slug: Option<String>,
    pub blocks: Vec<Block>,
}

/// Page content unit, discriminated by the CMS `__component` field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Block {
    #[serde(rename_all = "camelCase")]
    Hero {
        title: Option<String>,
        subtitle: Option<String>,
        image: Option<String>,
        cta_label: Option<String>,
        cta_url: Option<String>,
    },
    RichText {
        body: String,
    },
    Cta {
        label: String,
        url: String,
        description: Option<String>,
    },
    Unknown {
        component: Option<String>,
        data: Value,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub slug: Option<String>,
    pub date: Option<String>,
    pub image: Option<String>,
    pub url: String,
    pub excerpt: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub slug: Option<String>,
    pub name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub venue: Option<String>,
    pub status: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub entries_open: bool,
    pub categories: Vec<String>,
    pub entries: Vec<EventEntry>,
    pub categories_with_entries: Vec<CategoryEntries>,
    pub documents: Vec<DocumentLink>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EventEntry {
    pub id: Option<String>,
    pub number: Option<String>,
    pub driver: String,
    pub vehicle: Option<String>,
    pub team: Option<String>,
    pub category: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CategoryEntries {
    pub name: String,
    pub entries: Vec<EventEntry>,
}
