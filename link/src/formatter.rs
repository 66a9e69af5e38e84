//! Shapes raw tabular responses into [`Page`]s.
//!
//! Both endpoint responses go through the same routine via
//! [`TabularResponse`], so headers and row layout are identical whichever
//! call produced the page.

use crate::error::{BqLinkError, Result};
use crate::models::{Page, Row, TabularResponse};

/// Format the first `row_limit` rows of `response`.
///
/// Headers follow schema field order and every row carries one cell per
/// header, in the same order. A `row_limit` smaller than the rows present
/// truncates; a larger one is a [`BqLinkError::FormatError`], as is a row
/// with fewer cells than the schema has fields. A response without a
/// schema yields empty headers and rows shaped by their own cell count.
pub fn format_page(response: &dyn TabularResponse, row_limit: usize) -> Result<Page> {
    let raw_rows = response.rows();
    if row_limit > raw_rows.len() {
        return Err(BqLinkError::FormatError(format!(
            "row limit {} exceeds the {} rows in the response",
            row_limit,
            raw_rows.len()
        )));
    }

    let headers = response
        .schema()
        .map(|schema| schema.column_names())
        .unwrap_or_default();

    let mut rows: Vec<Row> = Vec::with_capacity(row_limit);
    for (index, raw) in raw_rows.iter().take(row_limit).enumerate() {
        let width = if headers.is_empty() {
            raw.f.len()
        } else {
            headers.len()
        };
        if raw.f.len() < width {
            return Err(BqLinkError::FormatError(format!(
                "row {} has {} cells but the schema has {} fields",
                index,
                raw.f.len(),
                width
            )));
        }
        rows.push(raw.f.iter().take(width).map(|cell| cell.v.clone()).collect());
    }

    Ok(Page {
        headers,
        rows,
        page_token: response.page_token().map(str::to_string),
        job_complete: response.job_complete(),
        job_reference: response.job_reference().cloned(),
        total_rows: response.total_rows(),
    })
}

/// Format every row of `response`.
pub fn format_all(response: &dyn TabularResponse) -> Result<Page> {
    format_page(response, response.rows().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        JobReference, JobResultsResponse, QueryResponse, TableFieldSchema, TableRow, TableSchema,
    };
    use serde_json::json;

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            TableFieldSchema::new("word", "STRING"),
            TableFieldSchema::new("count", "INTEGER"),
        ])
    }

    fn response(rows: usize) -> QueryResponse {
        QueryResponse {
            schema: Some(schema()),
            job_reference: Some(JobReference::new("proj", "job_1")),
            total_rows: Some(rows as u64),
            rows: (0..rows)
                .map(|i| TableRow::new(vec![json!(format!("w{}", i)), json!(i.to_string())]))
                .collect(),
            job_complete: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_headers_follow_schema_order() {
        let page = format_all(&response(2)).unwrap();
        assert_eq!(page.headers, vec!["word", "count"]);
        assert_eq!(page.rows[1], vec![json!("w1"), json!("1")]);
        assert!(page.job_complete);
        assert_eq!(page.total_rows, Some(2));
        assert_eq!(page.job_reference, Some(JobReference::new("proj", "job_1")));
    }

    #[test]
    fn test_row_limit_truncates() {
        let page = format_page(&response(5), 3).unwrap();
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.rows[2][0], json!("w2"));
    }

    #[test]
    fn test_row_limit_beyond_rows_is_format_error() {
        let err = format_page(&response(2), 3).unwrap_err();
        assert!(matches!(err, BqLinkError::FormatError(_)));
    }

    #[test]
    fn test_short_row_is_format_error() {
        let mut resp = response(1);
        resp.rows.push(TableRow::new(vec![json!("only-one")]));
        let err = format_all(&resp).unwrap_err();
        assert!(matches!(err, BqLinkError::FormatError(_)));
    }

    #[test]
    fn test_nulls_and_nested_values_pass_through() {
        let mut resp = response(0);
        resp.rows = vec![TableRow::new(vec![json!(null), json!({"f": [{"v": "1"}]})])];
        let page = format_all(&resp).unwrap();
        assert_eq!(page.rows[0][0], json!(null));
        assert_eq!(page.rows[0][1], json!({"f": [{"v": "1"}]}));
    }

    #[test]
    fn test_missing_schema_gives_empty_headers() {
        let resp = JobResultsResponse {
            rows: vec![TableRow::new(vec![json!("a"), json!("b")])],
            job_complete: true,
            page_token: Some("next".into()),
            ..Default::default()
        };
        let page = format_all(&resp).unwrap();
        assert!(page.headers.is_empty());
        assert_eq!(page.rows[0].len(), 2);
        assert_eq!(page.page_token.as_deref(), Some("next"));
    }

    #[test]
    fn test_same_output_for_both_response_kinds() {
        let query = response(2);
        let results = JobResultsResponse {
            schema: query.schema.clone(),
            rows: query.rows.clone(),
            total_rows: query.total_rows,
            job_complete: true,
            ..Default::default()
        };
        let a = format_all(&query).unwrap();
        let b = format_all(&results).unwrap();
        assert_eq!(a.headers, b.headers);
        assert_eq!(a.rows, b.rows);
    }
}
