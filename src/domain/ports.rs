use crate::domain::model::{Branch, Headquarter};
use crate::utils::error::{Result, StoreResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Point in time after which a store operation is abandoned.
///
/// Created once per request (or per import run) and passed down to every repository call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }
}

/// Conditions a headquarter document must satisfy. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub swift_code: Option<String>,
    pub is_headquarter: Option<bool>,
    pub country_iso2: Option<String>,
    /// `branches.swiftCode == x`
    pub with_branch: Option<String>,
    /// no element of `branches` has `swiftCode == x`
    pub without_branch: Option<String>,
}

impl Filter {
    pub fn headquarter(swift_code: &str) -> Self {
        Self {
            swift_code: Some(swift_code.to_string()),
            is_headquarter: Some(true),
            ..Self::default()
        }
    }

    pub fn country(country_iso2: &str) -> Self {
        Self {
            country_iso2: Some(country_iso2.to_string()),
            is_headquarter: Some(true),
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, swift_code: &str) -> Self {
        self.with_branch = Some(swift_code.to_string());
        self
    }

    pub fn without_branch(mut self, swift_code: &str) -> Self {
        self.without_branch = Some(swift_code.to_string());
        self
    }

    pub fn matches(&self, doc: &Headquarter) -> bool {
        let has_branch = |code: &str| doc.branches.iter().any(|b| b.swift_code.as_str() == code);

        self.swift_code.as_deref().map_or(true, |c| doc.swift_code.as_str() == c)
            && self.is_headquarter.map_or(true, |h| doc.is_headquarter == h)
            && self.country_iso2.as_deref().map_or(true, |c| doc.country_iso2.as_str() == c)
            && self.with_branch.as_deref().map_or(true, has_branch)
            && self.without_branch.as_deref().map_or(true, |c| !has_branch(c))
    }
}

/// Which part of a matched document to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Full,
    /// Only the branch element matched by [`Filter::with_branch`], like a positional `branches.$`.
    MatchedBranch,
}

impl Projection {
    pub fn apply(self, filter: &Filter, mut doc: Headquarter) -> Headquarter {
        if let (Projection::MatchedBranch, Some(code)) = (self, filter.with_branch.as_deref()) {
            doc.branches.retain(|b| b.swift_code.as_str() == code);
            doc.branches.truncate(1);
        }
        doc
    }
}

/// Single-document modification applied atomically by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Append to the embedded branch array.
    PushBranch(Branch),
    /// Remove every embedded branch with this SWIFT code.
    PullBranch(String),
}

impl Update {
    /// Applies the update, returning whether the document changed.
    pub fn apply(&self, doc: &mut Headquarter) -> bool {
        match self {
            Update::PushBranch(branch) => {
                doc.branches.push(branch.clone());
                true
            }
            Update::PullBranch(code) => {
                let before = doc.branches.len();
                doc.branches.retain(|b| b.swift_code.as_str() != code);
                doc.branches.len() != before
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Collection of headquarter documents with a unique `swiftCode` and an index on `countryISO2`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ensure_indexes(&self) -> StoreResult<()>;

    async fn find_one(&self, filter: &Filter, projection: Projection)
        -> StoreResult<Option<Headquarter>>;

    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Headquarter>>;

    /// Fails with [`crate::utils::error::StoreError::DuplicateKey`] when the code is taken.
    async fn insert_one(&self, doc: &Headquarter) -> StoreResult<()>;

    async fn insert_many(&self, docs: &[Headquarter]) -> StoreResult<usize>;

    /// Applies `update` to the first document matching `filter`.
    async fn update_one(&self, filter: &Filter, update: &Update) -> StoreResult<UpdateResult>;

    /// Returns the number of deleted documents.
    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64>;

    async fn drop_collection(&self) -> StoreResult<()>;

    async fn count(&self) -> StoreResult<u64>;
}

/// Producer of the raw CSV export used by the bulk import.
#[async_trait]
pub trait BankSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch_csv(&self) -> Result<String>;
}

#[async_trait]
impl BankSource for Box<dyn BankSource> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    async fn fetch_csv(&self) -> Result<String> {
        (**self).fetch_csv().await
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;
    type Output: Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, data: Self::Transformed) -> Result<Self::Output>;
}
