//! Query strings for the CMS REST API (Strapi v5 conventions).
//!
//! Publication state is always expressed as `status=published|draft`. The
//! legacy `publicationState=` parameter is never emitted.

use crate::tenant::TenantIdentity;

/// Which revision of CMS content a lookup may see.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PublicationMode {
    #[default]
    Live,
    /// Unpublished content. Only reachable through a verified draft session.
    Draft,
}

impl PublicationMode {
    pub fn status(&self) -> &'static str {
        match self {
            PublicationMode::Live => "published",
            PublicationMode::Draft => "draft",
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, PublicationMode::Draft)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CmsQuery {
    pairs: Vec<(String, String)>,
}

impl CmsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for a page lookup: tenant clause on the `site` relation, optional
    /// exact path filter, publication state and full population.
    pub fn for_page(path: Option<&str>, tenant: &TenantIdentity, mode: PublicationMode) -> Self {
        let query = CmsQuery::new().tenant(tenant, Some("site"));
        let query = match path {
            Some(path) => query.filter(&["path"], "$eq", path),
            None => query,
        };
        query.publication(mode).populate_all()
    }

    /// Adds the tenant clause.
    ///
    /// With `relation` set the clause filters through that relation
    /// (`filters[site][slug][$eq]=..`), otherwise it filters the site
    /// collection itself. The slug is preferred; the host is only used with a
    /// case-insensitive contains match on `domain`.
    pub fn tenant(self, tenant: &TenantIdentity, relation: Option<&str>) -> Self {
        let prefix: Vec<&str> = relation.into_iter().collect();

        match (&tenant.slug, &tenant.host) {
            (Some(slug), _) => {
                let path: Vec<&str> = prefix.iter().copied().chain(["slug"]).collect();
                self.filter(&path, "$eq", slug)
            }
            (None, Some(host)) => {
                let path: Vec<&str> = prefix.iter().copied().chain(["domain"]).collect();
                self.filter(&path, "$containsi", host)
            }
            (None, None) => self,
        }
    }

    /// `filters[a][b][op]=value`
    pub fn filter(mut self, path: &[&str], op: &str, value: &str) -> Self {
        let mut key = String::from("filters");
        for segment in path {
            key.push('[');
            key.push_str(segment);
            key.push(']');
        }
        key.push('[');
        key.push_str(op);
        key.push(']');
        self.pairs.push((key, value.to_string()));
        self
    }

    pub fn publication(mut self, mode: PublicationMode) -> Self {
        self.pairs.push(("status".into(), mode.status().into()));
        self
    }

    pub fn populate_all(self) -> Self {
        self.populate("populate", "*")
    }

    /// Raw populate clause, e.g. `populate[blocks]=*`.
    pub fn populate(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Populates a self-referencing relation `depth` levels deep:
    /// `populate[parent][populate][parent]=true` for a depth of 2.
    pub fn populate_chain(self, relation: &str, depth: usize) -> Self {
        if depth == 0 {
            return self;
        }
        let mut key = format!("populate[{relation}]");
        for _ in 1..depth {
            key.push_str(&format!("[populate][{relation}]"));
        }
        self.populate(&key, "true")
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.pairs
            .push(("sort".into(), format!("{field}:{}", order.as_str())));
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.pairs
            .push(("pagination[pageSize]".into(), size.to_string()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}
