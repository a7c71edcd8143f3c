//! Common API types and utilities

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

mod string_or_number {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(u32),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) => s.parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Query-string boolean flags: `true`/`false`, `1`/`0`, or a JSON bool.
pub mod flag {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrBool {
            Bool(bool),
            Str(String),
        }

        match StringOrBool::deserialize(deserializer)? {
            StringOrBool::Bool(b) => Ok(b),
            StringOrBool::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" | "" => Ok(false),
                other => Err(de::Error::custom(format!("invalid flag: {}", other))),
            },
        }
    }
}

/// Pagination parameters (page is zero-based)
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    page: Option<u32>,
    #[serde(default, alias = "limit", deserialize_with = "string_or_number::deserialize_u32_opt")]
    size: Option<u32>,
}

impl PaginationParams {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    pub fn size(&self) -> u32 {
        self.size.unwrap_or(20).clamp(1, 200)
    }

    pub fn offset(&self) -> usize {
        (self.page() as usize) * (self.size() as usize)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, size: u32, total: u64) -> Self {
        let size_nonzero = u64::from(size.max(1));
        let total_pages = total.div_ceil(size_nonzero) as u32;
        Self {
            data,
            page,
            size,
            total,
            total_pages,
        }
    }

    /// Cut one page out of a full result set, mapping each item.
    pub fn paginate<S>(items: Vec<S>, params: &PaginationParams, map: impl Fn(S) -> T) -> Self {
        let total = items.len() as u64;
        let data = items
            .into_iter()
            .skip(params.offset())
            .take(params.size() as usize)
            .map(map)
            .collect();
        Self::new(data, params.page(), params.size(), total)
    }
}

/// Success response with optional message
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Created response with ID
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

impl CreatedResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Count response (unread notifications, bulk updates)
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_accepts_strings() {
        let params: PaginationParams = serde_json::from_str(r#"{"page":"2","limit":"5"}"#).unwrap();
        assert_eq!(params.page(), 2);
        assert_eq!(params.size(), 5);
        assert_eq!(params.offset(), 10);
    }

    #[test]
    fn test_paginate_cuts_page() {
        let items: Vec<u32> = (0..45).collect();
        let page = PaginatedResponse::paginate(items, &PaginationParams::new(2, 20), |n| n * 10);
        assert_eq!(page.data, vec![400, 410, 420, 430, 440]);
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let page = PaginatedResponse::<u32>::paginate(Vec::<u32>::new(), &PaginationParams::default(), |n| n);
        assert_eq!(page.total_pages, 0);
        assert!(page.data.is_empty());
    }
}
