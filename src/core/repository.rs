use crate::domain::model::{Branch, Headquarter};
use crate::domain::ports::{Deadline, DocumentStore, Filter, Projection, Update};
use crate::domain::swift_code::{CountryCode, SwiftCode};
use crate::utils::error::{BankError, Result, StoreError, StoreResult};
use std::future::Future;
use std::sync::Arc;

/// Hierarchy-aware reads and writes over a [`DocumentStore`].
///
/// Every call is bounded by the caller's [`Deadline`]; an elapsed deadline drops the pending
/// store future and surfaces [`BankError::Timeout`]. Nothing is retried.
#[derive(Clone)]
pub struct BankRepository {
    store: Arc<dyn DocumentStore>,
}

impl BankRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn run<T, F>(&self, operation: &str, deadline: Deadline, fut: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout_at(deadline.instant(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(StoreError::DuplicateKey { key })) => Err(BankError::already_exists(format!(
                "Headquarter with SWIFT code {} already exists",
                key
            ))),
            Ok(Err(StoreError::Cancelled)) => Err(BankError::Timeout {
                operation: operation.to_string(),
            }),
            Ok(Err(e)) => {
                tracing::error!("❌ {} failed: {}", operation, e);
                Err(BankError::database(operation, e))
            }
            Err(_) => {
                tracing::warn!("⏱️ {} exceeded its deadline", operation);
                Err(BankError::Timeout {
                    operation: operation.to_string(),
                })
            }
        }
    }

    pub async fn ensure_indexes(&self, deadline: Deadline) -> Result<()> {
        self.run("ensure_indexes", deadline, self.store.ensure_indexes())
            .await
    }

    pub async fn count(&self, deadline: Deadline) -> Result<u64> {
        self.run("count", deadline, self.store.count()).await
    }

    pub async fn find_headquarter(
        &self,
        swift_code: &SwiftCode,
        deadline: Deadline,
    ) -> Result<Headquarter> {
        let filter = Filter::headquarter(swift_code.as_str());
        self.run(
            "find_headquarter",
            deadline,
            self.store.find_one(&filter, Projection::Full),
        )
        .await?
        .ok_or_else(|| {
            BankError::not_found(format!(
                "No headquarter found with SWIFT code: {}",
                swift_code
            ))
        })
    }

    /// Reads the parent document projected down to the one matching branch.
    pub async fn find_branch(&self, swift_code: &SwiftCode, deadline: Deadline) -> Result<Branch> {
        let parent = swift_code.parent_key();
        let filter = Filter::headquarter(parent.as_str()).with_branch(swift_code.as_str());

        let doc = self
            .run(
                "find_branch",
                deadline,
                self.store.find_one(&filter, Projection::MatchedBranch),
            )
            .await?;

        doc.and_then(|hq| hq.branches.into_iter().next())
            .ok_or_else(|| {
                BankError::not_found(format!("No branch found with SWIFT code: {}", swift_code))
            })
    }

    /// Headquarters (with branches) registered under a country. Zero matches is `NotFound`.
    pub async fn find_by_country(
        &self,
        country_iso2: &CountryCode,
        deadline: Deadline,
    ) -> Result<Vec<Headquarter>> {
        let filter = Filter::country(country_iso2.as_str());
        let found = self
            .run("find_by_country", deadline, self.store.find(&filter))
            .await?;

        if found.is_empty() {
            return Err(BankError::not_found(format!(
                "No banks found for country code: {}",
                country_iso2
            )));
        }
        Ok(found)
    }

    pub async fn create_headquarter(&self, hq: &Headquarter, deadline: Deadline) -> Result<()> {
        let filter = Filter::headquarter(hq.swift_code.as_str());
        let existing = self
            .run(
                "create_headquarter",
                deadline,
                self.store.find_one(&filter, Projection::Full),
            )
            .await?;
        if existing.is_some() {
            return Err(BankError::already_exists(format!(
                "Headquarter with SWIFT code {} already exists",
                hq.swift_code
            )));
        }

        // 唯一索引擋住並發插入
        self.run("create_headquarter", deadline, self.store.insert_one(hq))
            .await?;
        tracing::debug!("Created headquarter {}", hq.swift_code);
        Ok(())
    }

    pub async fn add_branch(
        &self,
        parent: &SwiftCode,
        branch: &Branch,
        deadline: Deadline,
    ) -> Result<()> {
        let hq = self.find_headquarter(parent, deadline).await.map_err(|e| match e {
            BankError::NotFound { .. } => BankError::not_found(format!(
                "Parent headquarter with SWIFT code {} not found",
                parent
            )),
            other => other,
        })?;
        if hq.has_branch(&branch.swift_code) {
            return Err(branch_exists(&branch.swift_code));
        }

        // The push only applies while the branch is still absent, so a concurrent writer
        // cannot produce a duplicate between the check above and this update.
        let filter = Filter::headquarter(parent.as_str()).without_branch(branch.swift_code.as_str());
        let result = self
            .run(
                "add_branch",
                deadline,
                self.store
                    .update_one(&filter, &Update::PushBranch(branch.clone())),
            )
            .await?;

        if result.modified_count == 0 {
            return match self.find_headquarter(parent, deadline).await {
                Ok(hq) if hq.has_branch(&branch.swift_code) => Err(branch_exists(&branch.swift_code)),
                Ok(_) | Err(BankError::NotFound { .. }) => Err(BankError::not_found(format!(
                    "Parent headquarter with SWIFT code {} not found",
                    parent
                ))),
                Err(other) => Err(other),
            };
        }

        tracing::debug!("Attached branch {} to {}", branch.swift_code, parent);
        Ok(())
    }

    /// Deletes the whole document, embedded branches included.
    pub async fn delete_headquarter(&self, swift_code: &SwiftCode, deadline: Deadline) -> Result<()> {
        let filter = Filter::headquarter(swift_code.as_str());
        let deleted = self
            .run("delete_headquarter", deadline, self.store.delete_one(&filter))
            .await?;

        if deleted == 0 {
            return Err(BankError::not_found(format!(
                "No headquarter found with SWIFT code: {}",
                swift_code
            )));
        }
        Ok(())
    }

    pub async fn delete_branch(&self, swift_code: &SwiftCode, deadline: Deadline) -> Result<()> {
        let parent = swift_code.parent_key();
        let filter = Filter::headquarter(parent.as_str());
        let result = self
            .run(
                "delete_branch",
                deadline,
                self.store
                    .update_one(&filter, &Update::PullBranch(swift_code.to_string())),
            )
            .await?;

        if result.modified_count == 0 {
            return Err(BankError::not_found(format!(
                "No branch found with SWIFT code: {}",
                swift_code
            )));
        }
        Ok(())
    }

    /// Drops the collection and bulk-inserts `docs`. Not safe alongside live traffic.
    pub async fn replace_all(&self, docs: &[Headquarter], deadline: Deadline) -> Result<usize> {
        self.run("drop_collection", deadline, self.store.drop_collection())
            .await?;
        self.ensure_indexes(deadline).await?;

        if docs.is_empty() {
            return Ok(0);
        }
        self.run("insert_many", deadline, self.store.insert_many(docs))
            .await
    }
}

fn branch_exists(swift_code: &SwiftCode) -> BankError {
    BankError::already_exists(format!(
        "Branch with SWIFT code {} already exists",
        swift_code
    ))
}
