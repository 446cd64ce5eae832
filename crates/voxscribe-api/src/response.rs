//! Success envelope shared by every JSON endpoint.
//!
//! All success bodies are `{ "success": true, "data": ..., "meta": ... }`;
//! error bodies carry `success: false` and an `error` object instead (see
//! the `error` module).

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            meta: None,
        }
    }

    pub fn ok_with_meta(data: T, meta: PaginationMeta) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            meta: Some(meta),
        }
    }
}

/// Pagination block returned by list endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl PaginationMeta {
    pub fn new(total: usize, page: usize, per_page: usize) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        PaginationMeta {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta_rounds_up() {
        let meta = PaginationMeta::new(5, 1, 2);
        assert_eq!(meta.total_pages, 3);
        let meta = PaginationMeta::new(4, 1, 2);
        assert_eq!(meta.total_pages, 2);
        let meta = PaginationMeta::new(0, 1, 2);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_envelope_shape() {
        let body = ApiResponse::ok_with_meta(vec![1, 2], PaginationMeta::new(2, 1, 20));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0], 1);
        assert_eq!(json["meta"]["perPage"], 20);
        assert_eq!(json["meta"]["totalPages"], 1);
    }
}
