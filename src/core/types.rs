//! core::types
//!
//! Strong types for the organisation domain.
//!
//! # Types
//!
//! - [`EntityId`] - Server-assigned identifier (GraphQL `ID` on reads, `Int` on writes)
//! - [`EntityName`] - Validated, non-blank entity name
//! - [`PageRequest`] - Validated pagination parameters
//! - [`Department`], [`SubDepartment`] and their summaries
//! - [`Listing`] - One page of entities plus pagination metadata
//!
//! # Validation
//!
//! Constructors enforce validity, so a blank name or a zero page cannot
//! reach the wire.
//!
//! # Examples
//!
//! ```
//! use orgdesk::core::types::{EntityName, Listing, PageRequest};
//!
//! assert!(EntityName::new("  ").is_err());
//! assert!(PageRequest::new(0, 10).is_err());
//!
//! let listing = Listing::paginate((1..=25).collect::<Vec<u32>>(), PageRequest::new(3, 10).unwrap());
//! assert_eq!(listing.items, vec![21, 22, 23, 24, 25]);
//! assert!(!listing.has_more);
//! assert_eq!(listing.page_count(), 3);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("name cannot be empty")]
    EmptyName,

    #[error("invalid page request: {0}")]
    InvalidPage(String),
}

/// Identifier assigned by the server.
///
/// The GraphQL schema exposes ids as `ID` (serialized as a string such as
/// `"12"`) but mutations take them as `Int`. This type accepts either form
/// on input and serializes back to the string form the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawId", into = "String")]
pub struct EntityId(i64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Wrap a numeric id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Numeric value, as mutations expect it.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Parse an id from user input or a string `ID`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidId` if the value is not an integer.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        raw.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidId(raw.to_string()))
    }
}

impl TryFrom<RawId> for EntityId {
    type Error = TypeError;

    fn try_from(raw: RawId) -> Result<Self, Self::Error> {
        match raw {
            RawId::Int(n) => Ok(Self(n)),
            RawId::Str(s) => Self::parse(&s),
        }
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A validated entity name.
///
/// Names are trimmed and must not be empty afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName(String);

impl EntityName {
    /// Create a validated name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::EmptyName` if the name is blank.
    pub fn new(name: impl AsRef<str>) -> Result<Self, TypeError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypeError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pagination parameters (`page` is 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Create validated pagination parameters.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPage` if `page` or `limit` is zero.
    pub fn new(page: u32, limit: u32) -> Result<Self, TypeError> {
        if page == 0 {
            return Err(TypeError::InvalidPage("page must be at least 1".into()));
        }
        if limit == 0 {
            return Err(TypeError::InvalidPage("limit must be at least 1".into()));
        }
        Ok(Self { page, limit })
    }

    /// First page with the given limit.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPage` if `limit` is zero.
    pub fn first(limit: u32) -> Result<Self, TypeError> {
        Self::new(1, limit)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The same limit on another page.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPage` if `page` is zero.
    pub fn with_page(&self, page: u32) -> Result<Self, TypeError> {
        Self::new(page, self.limit)
    }
}

/// Sub-department as projected inside a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDepartmentSummary {
    pub id: EntityId,
    pub name: String,
}

/// Reference to the department that owns a sub-department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRef {
    pub id: EntityId,
    pub name: String,
}

/// A department and the read projection of its sub-departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub sub_departments: Vec<SubDepartmentSummary>,
}

impl Department {
    /// Reference form, as embedded in sub-departments.
    pub fn as_ref_summary(&self) -> DepartmentRef {
        DepartmentRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// A sub-department and its owning department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDepartment {
    pub id: EntityId,
    pub name: String,
    pub department: DepartmentRef,
}

/// One page of entities as returned by a paginated query.
///
/// `total` is the server's count across all pages. `has_more` is true iff
/// items exist past the end of this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl<T> Listing<T> {
    /// Build one page out of a complete, ordered collection.
    pub fn paginate(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let start = (u64::from(request.page()) - 1) * u64::from(request.limit());
        let items: Vec<T> = all
            .into_iter()
            .skip(start as usize)
            .take(request.limit() as usize)
            .collect();

        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
            has_more: u64::from(request.page()) * u64::from(request.limit()) < total,
        }
    }

    /// Wrap an unpaginated collection as a single page.
    pub fn single_page(all: Vec<T>) -> Self {
        let total = all.len() as u64;
        let limit = u32::try_from(all.len()).unwrap_or(u32::MAX).max(1);
        Self {
            items: all,
            total,
            page: 1,
            limit,
            has_more: false,
        }
    }

    /// Number of pages implied by `total` and `limit`, never less than 1.
    pub fn page_count(&self) -> u64 {
        page_count(self.total, self.limit)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `ceil(total / limit)` with a floor of 1.
pub fn page_count(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 1;
    }
    total.div_ceil(u64::from(limit)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entity_id {
        use super::*;

        #[test]
        fn deserializes_from_string_and_number() {
            let from_str: EntityId = serde_json::from_str("\"42\"").unwrap();
            let from_num: EntityId = serde_json::from_str("42").unwrap();
            assert_eq!(from_str, EntityId::new(42));
            assert_eq!(from_num, EntityId::new(42));
        }

        #[test]
        fn serializes_as_string() {
            let json = serde_json::to_string(&EntityId::new(7)).unwrap();
            assert_eq!(json, "\"7\"");
        }

        #[test]
        fn rejects_non_numeric() {
            assert!(EntityId::parse("abc").is_err());
            assert!(serde_json::from_str::<EntityId>("\"x1\"").is_err());
        }
    }

    mod entity_name {
        use super::*;

        #[test]
        fn trims_whitespace() {
            let name = EntityName::new("  Engineering ").unwrap();
            assert_eq!(name.as_str(), "Engineering");
        }

        #[test]
        fn blank_is_rejected() {
            assert_eq!(EntityName::new(""), Err(TypeError::EmptyName));
            assert_eq!(EntityName::new(" \t"), Err(TypeError::EmptyName));
        }
    }

    mod listing {
        use super::*;

        fn page(n: u32) -> Listing<u32> {
            Listing::paginate((1..=25).collect(), PageRequest::new(n, 10).unwrap())
        }

        #[test]
        fn has_more_tracks_page_boundary() {
            assert!(page(1).has_more);
            assert!(page(2).has_more);
            assert!(!page(3).has_more);
            assert_eq!(page(3).items.len(), 5);
        }

        #[test]
        fn page_count_rounds_up() {
            assert_eq!(page(1).page_count(), 3);
        }

        #[test]
        fn page_count_floor_is_one() {
            let empty: Listing<u32> = Listing::paginate(vec![], PageRequest::first(10).unwrap());
            assert_eq!(empty.page_count(), 1);
            assert!(!empty.has_more);
        }

        #[test]
        fn exact_multiple_has_no_extra_page() {
            let listing = Listing::paginate((1..=20).collect::<Vec<u32>>(), PageRequest::new(2, 10).unwrap());
            assert!(!listing.has_more);
            assert_eq!(listing.page_count(), 2);
        }

        #[test]
        fn deserializes_camel_case() {
            let json = r#"{"items":[],"total":5,"page":1,"limit":10,"hasMore":false}"#;
            let listing: Listing<Department> = serde_json::from_str(json).unwrap();
            assert_eq!(listing.total, 5);
            assert!(!listing.has_more);
        }
    }

    #[test]
    fn department_defaults_missing_sub_departments() {
        let dept: Department = serde_json::from_str(r#"{"id":"1","name":"Ops"}"#).unwrap();
        assert!(dept.sub_departments.is_empty());
    }

    #[test]
    fn page_request_validation() {
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(0, 1).is_err());
        let req = PageRequest::new(2, 10).unwrap();
        assert_eq!(req.with_page(3).unwrap().page(), 3);
    }
}
