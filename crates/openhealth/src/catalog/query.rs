//! Filtering and ranking pipeline.
//!
//! Each stage is a free function over borrowed records so it can be tested
//! on its own. [`super::ResourceCatalog::query`] chains them in the order
//! category → text → distance → radius → sort.

use std::collections::BTreeSet;

use serde::Serialize;

use super::ResourceRecord;
use crate::geo::Coordinate;

/// Which categories a query admits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every record, whatever its category.
    #[default]
    All,
    /// Only records whose category is in the set. An empty set admits all.
    Only(BTreeSet<String>),
}

impl CategoryFilter {
    /// Build a filter from category names. No names means [`CategoryFilter::All`].
    #[must_use]
    pub fn only<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = categories.into_iter().map(Into::into).collect();
        if set.is_empty() {
            Self::All
        } else {
            Self::Only(set)
        }
    }

    /// Whether a category passes the filter. Matching is exact.
    #[must_use]
    pub fn allows(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.is_empty() || set.contains(category),
        }
    }
}

/// A record field the text filter may search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    /// The display name.
    Name,
    /// The street address.
    Address,
    /// The free-text notes.
    Notes,
}

impl SearchField {
    fn value(self, record: &ResourceRecord) -> &str {
        match self {
            Self::Name => &record.name,
            Self::Address => &record.address,
            Self::Notes => record.notes.as_deref().unwrap_or_default(),
        }
    }
}

/// Case-insensitive substring filter over a caller-chosen list of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFilter {
    needle: String,
    fields: Vec<SearchField>,
}

impl TextFilter {
    /// Search `fields` for `text`. Blank text disables the filter.
    #[must_use]
    pub fn new(text: &str, fields: &[SearchField]) -> Self {
        Self {
            needle: text.trim().to_lowercase(),
            fields: fields.to_vec(),
        }
    }

    /// Map view search: name and address.
    #[must_use]
    pub fn map_view(text: &str) -> Self {
        Self::new(text, &[SearchField::Name, SearchField::Address])
    }

    /// Directory view search: name, address and notes.
    #[must_use]
    pub fn directory_view(text: &str) -> Self {
        Self::new(
            text,
            &[SearchField::Name, SearchField::Address, SearchField::Notes],
        )
    }

    /// Whether this filter lets everything through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// The lower-cased search text.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Whether a record matches.
    #[must_use]
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        self.is_empty()
            || self
                .fields
                .iter()
                .any(|field| field.value(record).to_lowercase().contains(&self.needle))
    }
}

/// Parameters for one ranking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Allowed categories.
    pub categories: CategoryFilter,
    /// Text filter.
    pub text: TextFilter,
    /// Where distances are measured from.
    pub origin: Coordinate,
    /// Records farther than this are dropped. Expected to be positive.
    pub radius_km: f64,
    /// Keep at most this many of the nearest results.
    pub limit: Option<usize>,
}

impl Query {
    /// A query admitting every category with no text filter and no cap.
    #[must_use]
    pub fn new(origin: Coordinate, radius_km: f64) -> Self {
        Self {
            categories: CategoryFilter::All,
            text: TextFilter::default(),
            origin,
            radius_km,
            limit: None,
        }
    }

    /// Restrict categories.
    #[must_use]
    pub fn with_categories(mut self, categories: CategoryFilter) -> Self {
        self.categories = categories;
        self
    }

    /// Add a text filter.
    #[must_use]
    pub fn with_text(mut self, text: TextFilter) -> Self {
        self.text = text;
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A record and its distance from the query origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedMatch<'a> {
    /// The matched record.
    #[serde(flatten)]
    pub record: &'a ResourceRecord,
    /// Great-circle distance from the origin, in kilometers.
    pub distance_km: f64,
}

/// Stage 1: keep records whose category the filter admits.
#[must_use]
pub fn filter_categories<'a>(
    records: impl IntoIterator<Item = &'a ResourceRecord>,
    filter: &CategoryFilter,
) -> Vec<&'a ResourceRecord> {
    records
        .into_iter()
        .filter(|record| filter.allows(&record.category))
        .collect()
}

/// Stage 2: keep records matching the text filter.
#[must_use]
pub fn filter_text<'a>(
    records: Vec<&'a ResourceRecord>,
    text: &TextFilter,
) -> Vec<&'a ResourceRecord> {
    if text.is_empty() {
        return records;
    }
    records.into_iter().filter(|r| text.matches(r)).collect()
}

/// Stage 3: compute each record's distance from `origin`.
#[must_use]
pub fn attach_distances(records: Vec<&ResourceRecord>, origin: Coordinate) -> Vec<RankedMatch<'_>> {
    records
        .into_iter()
        .map(|record| RankedMatch {
            record,
            distance_km: origin.distance_km(&record.location()),
        })
        .collect()
}

/// Stage 4: drop matches farther than `radius_km`. The boundary is inclusive.
#[must_use]
pub fn within_radius(matches: Vec<RankedMatch<'_>>, radius_km: f64) -> Vec<RankedMatch<'_>> {
    matches
        .into_iter()
        .filter(|m| m.distance_km <= radius_km)
        .collect()
}

/// Stage 5: stable ascending sort by distance. Ties keep load order.
#[must_use]
pub fn order_by_distance(mut matches: Vec<RankedMatch<'_>>) -> Vec<RankedMatch<'_>> {
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    matches
}
