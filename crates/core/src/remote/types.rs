//! Wire shapes of the remote search and detail APIs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mirror::{CatalogItem, SearchPage};

const DOCUMENT_TYPE: &str = "comicseries";

/// Body of a bulk search POST.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequestBody<'a> {
    pub engine_key: &'a str,
    pub page: u32,
    pub per_page: u32,
    pub document_types: [&'static str; 1],
    pub filters: BTreeMap<&'static str, String>,
    pub sort_field: BTreeMap<&'static str, &'static str>,
    pub sort_direction: BTreeMap<&'static str, &'static str>,
}

impl<'a> SearchRequestBody<'a> {
    /// Newest series first.
    pub fn new(engine_key: &'a str, page: u32, per_page: u32) -> Self {
        Self {
            engine_key,
            page,
            per_page,
            document_types: [DOCUMENT_TYPE],
            filters: BTreeMap::new(),
            sort_field: BTreeMap::from([(DOCUMENT_TYPE, "first_released")]),
            sort_direction: BTreeMap::from([(DOCUMENT_TYPE, "desc")]),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub record_count: u64,
    pub records: SearchRecords,
    pub info: SearchInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchRecords {
    #[serde(default)]
    pub comicseries: Option<Vec<SeriesRecord>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeriesRecord {
    pub uuid: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub imprints: Option<Vec<String>>,
    #[serde(default)]
    pub books_count: u32,
    #[serde(default)]
    pub issue_count: u32,
    #[serde(default)]
    pub volume_count: u32,
    #[serde(default)]
    pub omnibus_count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchInfo {
    pub comicseries: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    pub current_page: u32,
    pub num_pages: u32,
    #[serde(default)]
    pub total_result_count: u64,
}

/// Detail endpoint response. `description` is required and must be a string.
#[derive(Debug, Deserialize)]
pub(crate) struct SeriesDetail {
    pub description: String,
}

impl From<SeriesRecord> for CatalogItem {
    fn from(record: SeriesRecord) -> Self {
        Self {
            id: record.uuid,
            title: record.title,
            slug: record.slug.unwrap_or_default(),
            description: None,
            genres: record.genres.unwrap_or_default().into_iter().collect(),
            imprints: record.imprints.unwrap_or_default().into_iter().collect(),
            book_count: record.books_count,
            issue_count: record.issue_count,
            volume_count: record.volume_count,
            omnibus_count: record.omnibus_count,
        }
    }
}

impl From<SearchResponse> for SearchPage {
    fn from(response: SearchResponse) -> Self {
        let info = response.info.comicseries;
        Self {
            items: response
                .records
                .comicseries
                .unwrap_or_default()
                .into_iter()
                .map(CatalogItem::from)
                .collect(),
            current_page: info.current_page.max(1),
            total_pages: info.num_pages.max(1),
            total_results: info.total_result_count,
        }
    }
}
