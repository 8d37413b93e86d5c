use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use fsdash_core::{
    apply_filter, district_options, map_pins, FilterPredicate, MapPin, ServiceKind, ServiceRecord,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{load_records, parse_kind, ApiError, ApiResponse, AppState, FeedFailure, ResponseMeta};

/// `?search=<text>&districts=<a,b,...>`; both optional.
///
/// `districts` may also be repeated (`?districts=a&districts=b`), and the
/// two forms can be mixed. Read from raw pairs because a plain struct
/// rejects duplicate keys.
#[derive(Debug, Default)]
pub(super) struct FilterQuery {
    pub search: Option<String>,
    pub districts: Vec<String>,
}

impl FilterQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "search" => query.search = Some(value),
                "districts" => query.districts.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_owned),
                ),
                _ => {}
            }
        }
        query
    }

    fn predicate(&self) -> FilterPredicate {
        let mut predicate = FilterPredicate::new().with_districts(self.districts.iter().cloned());
        if let Some(search) = self.search.as_deref() {
            predicate = predicate.with_search(search.trim());
        }
        predicate
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RecordsData {
    pub kind: ServiceKind,
    pub records: Vec<ServiceRecord>,
    /// Rows after filtering.
    pub total: usize,
    /// Rows in the cached set before filtering.
    pub available: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub error: Option<FeedFailure>,
}

#[derive(Debug, Serialize)]
pub(super) struct PinsData {
    pub kind: ServiceKind,
    pub pins: Vec<MapPin>,
    pub total: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub error: Option<FeedFailure>,
}

#[derive(Debug, Serialize)]
pub(super) struct DistrictsData {
    pub kind: ServiceKind,
    pub districts: Vec<String>,
    pub error: Option<FeedFailure>,
}

pub(super) async fn list_records(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(kind): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<RecordsData>>, ApiError> {
    let kind = parse_kind(&req_id.0, &kind)?;

    let data = match load_records(&state, kind).await {
        Ok(cached) => {
            let records = apply_filter(&cached.records, &FilterQuery::from_pairs(pairs).predicate());
            RecordsData {
                kind,
                total: records.len(),
                available: cached.records.len(),
                records,
                fetched_at: Some(cached.fetched_at),
                error: None,
            }
        }
        Err(failure) => RecordsData {
            kind,
            records: Vec::new(),
            total: 0,
            available: 0,
            fetched_at: None,
            error: Some(failure),
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_pins(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(kind): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<PinsData>>, ApiError> {
    let kind = parse_kind(&req_id.0, &kind)?;

    let data = match load_records(&state, kind).await {
        Ok(cached) => {
            let pins = map_pins(&apply_filter(&cached.records, &FilterQuery::from_pairs(pairs).predicate()));
            PinsData {
                kind,
                total: pins.len(),
                pins,
                fetched_at: Some(cached.fetched_at),
                error: None,
            }
        }
        Err(failure) => PinsData {
            kind,
            pins: Vec::new(),
            total: 0,
            fetched_at: None,
            error: Some(failure),
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_districts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<DistrictsData>>, ApiError> {
    let kind = parse_kind(&req_id.0, &kind)?;

    let data = match load_records(&state, kind).await {
        Ok(cached) => DistrictsData {
            kind,
            districts: district_options(&cached.records),
            error: None,
        },
        Err(failure) => DistrictsData {
            kind,
            districts: Vec::new(),
            error: Some(failure),
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> FilterQuery {
        FilterQuery::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    #[test]
    fn empty_query_is_an_empty_predicate() {
        assert!(query(&[]).predicate().is_empty());
        assert!(query(&[("search", "  "), ("districts", " , ,")])
            .predicate()
            .is_empty());
    }

    #[test]
    fn districts_are_split_on_commas_and_trimmed() {
        let predicate = query(&[("districts", "灣仔, 東區 ,")]).predicate();
        assert_eq!(
            predicate.districts.into_iter().collect::<Vec<_>>(),
            vec!["東區".to_owned(), "灣仔".to_owned()]
        );
    }

    #[test]
    fn repeated_districts_are_merged_with_comma_lists() {
        let predicate = query(&[
            ("districts", "灣仔"),
            ("districts", "東區,中西區"),
            ("page", "2"),
        ])
        .predicate();
        assert_eq!(predicate.districts.len(), 3);
        assert!(predicate.districts.contains("中西區"));
    }

    #[test]
    fn search_is_trimmed() {
        let predicate = query(&[("search", " 中心 ")]).predicate();
        assert_eq!(predicate.search.as_deref(), Some("中心"));
    }
}
