//! Normalises the backend's response envelopes into fixed shapes.

use samsoft_core::{AppError, AppResult};
use samsoft_domain::{ListQuery, ListResult, Pagination, ResourceRecord};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct WirePagination {
    current_page: Option<u32>,
    page_size: Option<u32>,
    total_records: Option<u64>,
    total_pages: Option<u32>,
}

/// Fails with [`AppError::Server`] when the envelope reports `success: false`.
pub(crate) fn ensure_success(body: &Value) -> AppResult<()> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(AppError::server(message(body)));
    }

    Ok(())
}

/// Returns the envelope's `message`, if any.
pub(crate) fn message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

/// Extracts one page of records.
///
/// Items come from `data`, `results`, the plural key or a bare array. When the
/// envelope carries no pagination the whole array is treated as the full
/// result set and paged locally.
pub(crate) fn list_result(
    body: Value,
    plural_key: &str,
    query: &ListQuery,
) -> AppResult<ListResult<ResourceRecord>> {
    let (items, wire_pagination) = match body {
        Value::Array(items) => (items, None),
        Value::Object(mut object) => {
            let wire_pagination = object
                .remove("pagination")
                .filter(|value| !value.is_null())
                .map(serde_json::from_value::<WirePagination>)
                .transpose()
                .map_err(|error| {
                    AppError::Internal(format!("malformed pagination envelope: {error}"))
                })?;

            let items = ["data", "results", plural_key]
                .iter()
                .find_map(|key| match object.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    Some(Value::Object(mut nested)) => match nested.remove(plural_key) {
                        Some(Value::Array(items)) => Some(items),
                        _ => nested
                            .remove("results")
                            .and_then(|value| value.as_array().cloned()),
                    },
                    _ => None,
                })
                .unwrap_or_default();

            (items, wire_pagination)
        }
        Value::Null => (Vec::new(), None),
        other => {
            return Err(AppError::Internal(format!(
                "unexpected list response shape: {other}"
            )));
        }
    };

    let records = items
        .into_iter()
        .map(ResourceRecord::from_value)
        .collect::<AppResult<Vec<_>>>()?;

    match wire_pagination {
        Some(wire) => {
            let page_size = wire.page_size.unwrap_or(query.page_size());
            let total_records = wire.total_records.unwrap_or_else(|| {
                wire.total_pages
                    .map(|pages| u64::from(pages) * u64::from(page_size))
                    .unwrap_or(records.len() as u64)
            });

            Ok(ListResult {
                items: records,
                pagination: Pagination::from_totals(
                    wire.current_page.unwrap_or(query.page()),
                    page_size,
                    total_records,
                ),
            })
        }
        None => Ok(page_locally(records, query)),
    }
}

fn page_locally(records: Vec<ResourceRecord>, query: &ListQuery) -> ListResult<ResourceRecord> {
    let page_size = query.page_size();
    let total_records = records.len() as u64;
    let pagination = Pagination::from_totals(query.page(), page_size, total_records);

    if total_records <= u64::from(page_size) {
        return ListResult {
            items: records,
            pagination,
        };
    }

    let skip = (pagination.current_page() as usize - 1) * page_size as usize;
    ListResult {
        items: records
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect(),
        pagination,
    }
}

/// Extracts a single record from `data`, the singular key or the body itself.
pub(crate) fn single_record(body: Value, singular_key: &str) -> AppResult<ResourceRecord> {
    let Value::Object(mut object) = body else {
        return Err(AppError::Internal(
            "record response was not a JSON object".to_owned(),
        ));
    };

    for key in ["data", singular_key] {
        match object.remove(key) {
            Some(Value::Object(record)) => {
                return ResourceRecord::from_value(Value::Object(record));
            }
            Some(Value::Array(mut records)) if records.len() == 1 => {
                return ResourceRecord::from_value(records.remove(0));
            }
            Some(Value::Null) => {
                return Err(AppError::NotFound("record not found".to_owned()));
            }
            _ => {}
        }
    }

    object.remove("success");
    object.remove("message");
    if object.is_empty() {
        return Err(AppError::NotFound("record not found".to_owned()));
    }
    ResourceRecord::from_value(Value::Object(object))
}

/// Extracts the saved record echoed by a create or update, if any.
pub(crate) fn echoed_record(body: &Value, singular_key: &str) -> Option<ResourceRecord> {
    ["data", singular_key]
        .iter()
        .filter_map(|key| body.get(*key))
        .find(|value| value.is_object())
        .and_then(|value| ResourceRecord::from_value(value.clone()).ok())
}
