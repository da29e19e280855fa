//! Event records from the events API and the CMS `events` collection.
//!
//! The events API has shipped PascalCase, snake_case and camelCase spellings
//! of the same fields at the same time, so every field goes through a
//! candidate-key table.

use crate::model::{CategoryEntries, Event, EventEntry};
use crate::normalize::normalize_documents;
use crate::shape::{
    absolutize, as_list, field, media_url, pick, pick_bool, pick_str, record_id, scalar_string,
};
use indexmap::IndexMap;
use serde_json::Value;

const EVENT_ID_KEYS: &[&str] = &["EventID", "event_id", "eventId", "ID", "id", "documentId"];
const EVENT_NAME_KEYS: &[&str] = &[
    "EventName", "event_name", "eventName", "Name", "name", "Title", "title",
];
const EVENT_SLUG_KEYS: &[&str] = &["EventSlug", "event_slug", "eventSlug", "Slug", "slug"];
const START_DATE_KEYS: &[&str] = &[
    "StartDate", "start_date", "startDate", "EventDate", "event_date", "eventDate", "Date", "date",
];
const END_DATE_KEYS: &[&str] = &["EndDate", "end_date", "endDate", "FinishDate", "finish_date"];
const VENUE_KEYS: &[&str] = &[
    "Venue", "venue", "VenueName", "venue_name", "venueName", "Track", "track", "Circuit",
    "Location", "location",
];
const VENUE_NAME_KEYS: &[&str] = &["Name", "name", "VenueName", "venue_name", "Title", "title"];
const STATUS_KEYS: &[&str] = &["Status", "status", "EventStatus", "event_status"];
const URL_KEYS: &[&str] = &[
    "EventURL", "event_url", "eventUrl", "URL", "Url", "url", "Link", "link", "EntryLink",
];
const IMAGE_KEYS: &[&str] = &[
    "Image", "image", "ImageURL", "image_url", "imageUrl", "Logo", "logo", "Banner", "banner",
];
const DESCRIPTION_KEYS: &[&str] = &["Description", "description", "Summary", "summary"];
const ENTRIES_OPEN_KEYS: &[&str] = &[
    "EntriesOpen", "entries_open", "entriesOpen", "IsOpen", "is_open", "isOpen",
];
const DOCUMENT_LIST_KEYS: &[&str] = &[
    "Documents", "documents", "Files", "files", "EventDocuments", "event_documents",
];

const CATEGORY_LIST_KEYS: &[&str] = &[
    "Categories", "categories", "Classes", "classes", "EventCategories", "event_categories",
];
const CATEGORY_NAME_KEYS: &[&str] = &[
    "CategoryName", "category_name", "categoryName", "ClassName", "class_name", "Name", "name",
    "Title", "title",
];
const ENTRY_LIST_KEYS: &[&str] = &["Entries", "entries", "Competitors", "competitors", "Drivers", "drivers"];
const ENTRY_CATEGORY_KEYS: &[&str] = &[
    "Category", "category", "CategoryName", "category_name", "ClassName", "class_name", "Class",
];

const ENTRY_ID_KEYS: &[&str] = &["EntryID", "entry_id", "entryId", "ID", "id"];
const DRIVER_KEYS: &[&str] = &[
    "DriverName", "driver_name", "driverName", "Driver", "driver", "CompetitorName",
    "competitor_name", "Competitor", "Name", "name",
];
const DRIVER_NAME_PARTS: &[(&str, &str)] = &[
    ("FirstName", "LastName"),
    ("first_name", "last_name"),
    ("firstName", "lastName"),
];
const NUMBER_KEYS: &[&str] = &[
    "CarNumber", "car_number", "carNumber", "RaceNumber", "race_number", "Number", "number", "No",
];
const VEHICLE_KEYS: &[&str] = &["Vehicle", "vehicle", "Car", "car", "CarModel", "car_model", "Make"];
const TEAM_KEYS: &[&str] = &["Team", "team", "TeamName", "team_name", "Club", "club"];

const EVENT_LIST_KEYS: &[&str] = &["events", "Events", "data", "Data", "results", "Results"];

/// Entries without a category land in this bucket.
pub const UNCATEGORISED: &str = "Uncategorised";

/// Collects the event objects out of an events API payload.
///
/// The payload may be a bare array, an object wrapping the list under one of
/// several keys, or a single event.
pub fn extract_events(payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(items) => items.iter().filter(|v| v.is_object()).collect(),
        Value::Object(map) => {
            for key in EVENT_LIST_KEYS {
                match map.get(*key) {
                    Some(Value::Array(items)) => {
                        return items.iter().filter(|v| v.is_object()).collect();
                    }
                    Some(inner @ Value::Object(_)) => return extract_events(inner),
                    _ => {}
                }
            }
            if looks_like_event(payload) {
                vec![payload]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn looks_like_event(value: &Value) -> bool {
    pick(value, EVENT_ID_KEYS).is_some() || pick(value, EVENT_NAME_KEYS).is_some()
}

/// Normalizes one event record.
///
/// `origin` is set for CMS records so relative media resolves against the CMS.
/// Records with neither a name nor an id are skipped.
pub fn normalize_event(record: &Value, origin: Option<&str>) -> Option<Event> {
    let name = pick_str(record, EVENT_NAME_KEYS);
    let id = pick_str(record, EVENT_ID_KEYS).or_else(|| record_id(record));
    let slug = pick_str(record, EVENT_SLUG_KEYS);

    let id = id.or_else(|| slug.clone()).or_else(|| name.clone())?;
    let name = name.unwrap_or_else(|| id.clone());

    let grouped = group_entries(record);
    let categories = grouped.keys().cloned().collect();
    let entries = grouped.values().flatten().cloned().collect();
    let categories_with_entries = grouped
        .into_iter()
        .map(|(name, entries)| CategoryEntries { name, entries })
        .collect();

    let documents = DOCUMENT_LIST_KEYS
        .iter()
        .filter_map(|key| field(record, key))
        .map(as_list)
        .find(|list| !list.is_empty())
        .map(|list| normalize_documents(list, origin))
        .unwrap_or_default();

    Some(Event {
        id,
        slug,
        name,
        start_date: pick_str(record, START_DATE_KEYS),
        end_date: pick_str(record, END_DATE_KEYS),
        venue: venue(record),
        status: pick_str(record, STATUS_KEYS),
        url: pick_str(record, URL_KEYS),
        image: pick(record, IMAGE_KEYS).and_then(media_url).map(|url| match origin {
            Some(origin) => absolutize(origin, &url),
            None => url,
        }),
        description: pick_str(record, DESCRIPTION_KEYS),
        entries_open: pick_bool(record, ENTRIES_OPEN_KEYS).unwrap_or(false),
        categories,
        entries,
        categories_with_entries,
        documents,
    })
}

pub fn normalize_events(payload: &Value, origin: Option<&str>) -> Vec<Event> {
    extract_events(payload)
        .into_iter()
        .filter_map(|record| normalize_event(record, origin))
        .collect()
}

/// Venue as a plain string or as a nested object with a name.
fn venue(record: &Value) -> Option<String> {
    let venue = pick(record, VENUE_KEYS)?;
    match venue {
        Value::Object(_) => pick_str(venue, VENUE_NAME_KEYS),
        other => scalar_string(other),
    }
}

/// One pass over the categories, grouped by category name in first-seen order.
/// Categories without entries are kept. Top-level entries are only read when
/// no category carried any, since some payloads repeat them there.
fn group_entries(record: &Value) -> IndexMap<String, Vec<EventEntry>> {
    let mut grouped: IndexMap<String, Vec<EventEntry>> = IndexMap::new();

    let categories = CATEGORY_LIST_KEYS
        .iter()
        .filter_map(|key| field(record, key))
        .map(as_list)
        .find(|list| !list.is_empty())
        .unwrap_or_default();

    for category in categories {
        let (name, entries) = match category {
            Value::Object(_) => (
                pick_str(category, CATEGORY_NAME_KEYS).unwrap_or_else(|| UNCATEGORISED.to_string()),
                entry_list(category),
            ),
            other => match scalar_string(other) {
                Some(name) => (name, &[][..]),
                None => continue,
            },
        };

        let bucket = grouped.entry(name.clone()).or_default();
        bucket.extend(entries.iter().map(|entry| normalize_entry(entry, &name)));
    }

    if grouped.values().any(|entries| !entries.is_empty()) {
        return grouped;
    }

    for entry in entry_list(record) {
        let name = pick_str(entry, ENTRY_CATEGORY_KEYS).unwrap_or_else(|| UNCATEGORISED.to_string());
        let normalized = normalize_entry(entry, &name);
        grouped.entry(name).or_default().push(normalized);
    }

    grouped
}

fn entry_list(value: &Value) -> &[Value] {
    ENTRY_LIST_KEYS
        .iter()
        .filter_map(|key| field(value, key))
        .map(as_list)
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

fn normalize_entry(entry: &Value, category: &str) -> EventEntry {
    EventEntry {
        id: pick_str(entry, ENTRY_ID_KEYS),
        number: pick_str(entry, NUMBER_KEYS),
        driver: driver_name(entry).unwrap_or_default(),
        vehicle: pick_str(entry, VEHICLE_KEYS),
        team: pick_str(entry, TEAM_KEYS),
        category: category.to_string(),
    }
}

fn driver_name(entry: &Value) -> Option<String> {
    if let Some(name) = pick_str(entry, DRIVER_KEYS) {
        return Some(name);
    }
    DRIVER_NAME_PARTS.iter().find_map(|(first, last)| {
        let parts: Vec<String> = [pick_str(entry, &[*first]), pick_str(entry, &[*last])]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    })
}
