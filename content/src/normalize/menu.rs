use crate::model::MenuItem;
use crate::normalize::page::page_path;
use crate::shape::{field, pick_bool, pick_i64, pick_str, record_id, relation_list};
use serde_json::Value;

const LABEL_KEYS: &[&str] = &["label", "title", "name", "text"];
const URL_KEYS: &[&str] = &["url", "href", "path", "link"];
const MENU_ITEM_LIST_KEYS: &[&str] = &["items", "links", "menuItems"];

const NAV_LABEL_KEYS: &[&str] = &["navLabel", "menuLabel", "title", "name"];
const SHOW_IN_NAV_KEYS: &[&str] = &["showInNav", "show_in_nav", "showInMenu", "inNav"];
const ORDER_KEYS: &[&str] = &["order", "navOrder", "menuOrder", "sortOrder"];

/// A single menu entry. Entries without both a label and a URL are skipped.
pub fn normalize_menu_item(value: &Value, index: usize) -> Option<MenuItem> {
    let label = pick_str(value, LABEL_KEYS)?;
    let url = pick_str(value, URL_KEYS)?;
    let id = record_id(value).unwrap_or_else(|| format!("menu-{index}"));
    Some(MenuItem { id, label, url })
}

pub fn normalize_menu_items(items: &[Value]) -> Vec<MenuItem> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| normalize_menu_item(item, index))
        .collect()
}

/// Items from the dedicated `menus` collection.
///
/// A menu record either carries an item list or is itself a single link.
pub fn menu_collection_items(records: &[Value]) -> Vec<MenuItem> {
    let mut items = Vec::new();
    for record in records {
        let nested = MENU_ITEM_LIST_KEYS
            .iter()
            .map(|key| relation_list(record, key))
            .find(|list| !list.is_empty());

        match nested {
            Some(list) => items.extend(normalize_menu_items(list)),
            None => items.extend(normalize_menu_item(record, items.len())),
        }
    }
    items
}

/// Builds a menu from the tenant's page list.
///
/// A page is shown when it sits at most one level below the root or is
/// flagged `showInNav`. A `false` flag does not hide a top-level page.
/// Items are ordered by the order field with ties and missing values keeping
/// list order (missing values sort last).
pub fn derive_menu(pages: &[Value]) -> Vec<MenuItem> {
    let mut candidates: Vec<(Option<i64>, MenuItem)> = pages
        .iter()
        .enumerate()
        .filter_map(|(index, page)| {
            let path = page_path(page);
            let depth = path.split('/').filter(|s| !s.is_empty()).count();

            let visible = depth <= 1 || pick_bool(page, SHOW_IN_NAV_KEYS) == Some(true);
            if !visible {
                return None;
            }

            let label = pick_str(page, NAV_LABEL_KEYS)
                .or_else(|| field(page, "slug").and_then(|v| v.as_str().map(str::to_string)))?;
            let id = record_id(page).unwrap_or_else(|| format!("page-{index}"));
            let order = pick_i64(page, ORDER_KEYS);

            Some((order, MenuItem { id, label, url: path }))
        })
        .collect();

    // sort_by_key is stable
    candidates.sort_by_key(|(order, _)| (order.is_none(), order.unwrap_or_default()));
    candidates.into_iter().map(|(_, item)| item).collect()
}
