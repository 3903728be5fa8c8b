use crate::adapters::parser::parse_bank_records;
use crate::core::repository::BankRepository;
use crate::core::transformer::{self, TransformOutcome};
use crate::domain::model::BankRecord;
use crate::domain::ports::{BankSource, Deadline, Pipeline};
use crate::utils::error::{BankError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// How many row errors are spelled out in the failure message.
const MAX_REPORTED_ROW_ERRORS: usize = 20;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Deadline for the drop-and-reinsert; much longer than a request deadline.
    pub deadline: Duration,
    /// Fail instead of warning on duplicate headquarters and orphan branches.
    pub strict: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(300),
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub source: String,
    pub headquarters: usize,
    pub branches: usize,
    pub replaced_headquarters: Vec<String>,
    pub replaced_branches: Vec<String>,
    pub orphan_branches: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Spreadsheet → validated rows → headquarter documents → store.
pub struct ImportPipeline<S: BankSource> {
    source: S,
    repo: BankRepository,
    options: ImportOptions,
}

impl<S: BankSource> ImportPipeline<S> {
    pub fn new(source: S, repo: BankRepository, options: ImportOptions) -> Self {
        Self {
            source,
            repo,
            options,
        }
    }
}

#[async_trait::async_trait]
impl<S: BankSource> Pipeline for ImportPipeline<S> {
    type Extracted = Vec<BankRecord>;
    type Transformed = TransformOutcome;
    type Output = ImportSummary;

    async fn extract(&self) -> Result<Vec<BankRecord>> {
        tracing::debug!("Fetching bank data from {}", self.source.describe());
        let csv_text = self.source.fetch_csv().await?;
        parse_bank_records(&csv_text)
    }

    async fn transform(&self, data: Vec<BankRecord>) -> Result<TransformOutcome> {
        let mut valid = Vec::with_capacity(data.len());
        let mut failures = Vec::new();

        for (index, record) in data.iter().enumerate() {
            match record.validate() {
                Ok(row) => valid.push(row),
                Err(errors) => failures.push(format!(
                    "validation failed for bank at index {}: {}",
                    index,
                    errors.join("; ")
                )),
            }
        }

        if !failures.is_empty() {
            for failure in failures.iter().take(MAX_REPORTED_ROW_ERRORS) {
                tracing::error!("{}", failure);
            }
            return Err(BankError::ImportError {
                message: format!(
                    "{} row(s) failed validation: {}",
                    failures.len(),
                    failures
                        .iter()
                        .take(MAX_REPORTED_ROW_ERRORS)
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(" | ")
                ),
            });
        }

        let outcome = transformer::transform(valid);
        if self.options.strict && outcome.has_anomalies() {
            return Err(BankError::ImportError {
                message: format!(
                    "{} duplicate headquarter(s), {} duplicate branch(es) and {} orphan branch(es) in source data",
                    outcome.replaced_headquarters.len(),
                    outcome.replaced_branches.len(),
                    outcome.orphan_branches.len()
                ),
            });
        }
        Ok(outcome)
    }

    async fn load(&self, data: TransformOutcome) -> Result<ImportSummary> {
        let started_at = Utc::now();
        let deadline = Deadline::after(self.options.deadline);

        let branches = data.branch_count();
        let replaced_headquarters = data
            .replaced_headquarters
            .iter()
            .map(ToString::to_string)
            .collect();
        let replaced_branches = data.replaced_branches.iter().map(ToString::to_string).collect();
        let orphan_branches = data.orphan_branches.iter().map(ToString::to_string).collect();

        let documents = data.into_documents();
        let headquarters = self.repo.replace_all(&documents, deadline).await?;

        Ok(ImportSummary {
            source: self.source.describe(),
            headquarters,
            branches,
            replaced_headquarters,
            replaced_branches,
            orphan_branches,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

pub struct ImportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P> ImportEngine<P>
where
    P: Pipeline<Extracted = Vec<BankRecord>, Transformed = TransformOutcome>,
{
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Extract and transform only; the store is not touched.
    pub async fn preview(&self) -> Result<TransformOutcome> {
        let raw = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} rows", raw.len());
        let outcome = self.pipeline.transform(raw).await?;
        tracing::info!(
            "🔄 Assembled {} headquarters with {} branches",
            outcome.headquarters.len(),
            outcome.branch_count()
        );
        Ok(outcome)
    }

    pub async fn run(&self) -> Result<P::Output> {
        tracing::info!("Starting import...");
        let outcome = self.preview().await?;

        tracing::info!("💾 Loading documents into the store...");
        let output = self.pipeline.load(outcome).await?;
        tracing::info!("✅ Import completed");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::domain::swift_code::SwiftCode;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StaticSource(String);

    #[async_trait]
    impl BankSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        async fn fetch_csv(&self) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    const HEADER: &str = "COUNTRY ISO2 CODE,SWIFT CODE,CODE TYPE,NAME,ADDRESS,TOWN NAME,COUNTRY NAME,TIME ZONE\n";

    fn engine(csv: String, strict: bool) -> (ImportEngine<ImportPipeline<StaticSource>>, BankRepository) {
        let repo = BankRepository::new(Arc::new(MemoryStore::new()));
        let pipeline = ImportPipeline::new(
            StaticSource(csv),
            repo.clone(),
            ImportOptions {
                strict,
                ..ImportOptions::default()
            },
        );
        (ImportEngine::new(pipeline), repo)
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_import_builds_hierarchy() {
        let csv = format!(
            "{HEADER}\
PL,BPKOPLPWXXX,BIC11,PKO BANK POLSKI S.A.,PULAWSKA 15 WARSZAWA,WARSZAWA,POLAND,Europe/Warsaw
PL,BPKOPLPW001,BIC11,PKO BANK POLSKI S.A.,ADDRESS 1,KRAKOW,POLAND,Europe/Warsaw
PL,BPKOPLPW002,BIC11,PKO BANK POLSKI S.A.,ADDRESS 2,GDANSK,POLAND,Europe/Warsaw
"
        );
        let (engine, repo) = engine(csv, false);
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.headquarters, 1);
        assert_eq!(summary.branches, 2);

        let hq = repo
            .find_headquarter(&SwiftCode::parse("BPKOPLPWXXX").unwrap(), deadline())
            .await
            .unwrap();
        let codes: Vec<&str> = hq.branches.iter().map(|b| b.swift_code.as_str()).collect();
        assert_eq!(codes, vec!["BPKOPLPW001", "BPKOPLPW002"]);
    }

    #[tokio::test]
    async fn test_invalid_rows_abort_before_store() {
        let csv = format!("{HEADER}PL,bpko,BIC11,PKO,ADDR,WARSZAWA,POLAND,Europe/Warsaw\n");
        let (engine, repo) = engine(csv, false);
        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, BankError::ImportError { .. }));
        assert!(err.to_string().contains("index 0"));
        assert_eq!(repo.count(deadline()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_branches_reported_or_rejected() {
        let csv = format!(
            "{HEADER}\
PL,BPKOPLPWXXX,BIC11,PKO,ADDR,WARSZAWA,POLAND,Europe/Warsaw
PL,BPKOPLPW001,BIC11,PKO,ADDR 1,KRAKOW,POLAND,Europe/Warsaw
PL,BPKOPLPW001,BIC11,PKO,ADDR 1,KRAKOW,POLAND,Europe/Warsaw
"
        );

        let (lenient, repo) = engine(csv.clone(), false);
        let summary = lenient.run().await.unwrap();
        assert_eq!(summary.branches, 1);
        assert_eq!(summary.replaced_branches, vec!["BPKOPLPW001".to_string()]);
        let hq = repo
            .find_headquarter(&SwiftCode::parse("BPKOPLPWXXX").unwrap(), deadline())
            .await
            .unwrap();
        assert_eq!(hq.branches.len(), 1);

        let (strict, repo) = engine(csv, true);
        let err = strict.run().await.unwrap_err();
        assert!(err.to_string().contains("1 duplicate branch(es)"));
        assert_eq!(repo.count(deadline()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_orphans_reported_or_rejected() {
        let csv = format!(
            "{HEADER}\
PL,BPKOPLPWXXX,BIC11,PKO,ADDR,WARSZAWA,POLAND,Europe/Warsaw
DE,DEUTDEFF500,BIC11,DEUTSCHE BANK,ADDR,BERLIN,GERMANY,Europe/Berlin
"
        );

        let (lenient, _) = engine(csv.clone(), false);
        let summary = lenient.run().await.unwrap();
        assert_eq!(summary.orphan_branches, vec!["DEUTDEFF500".to_string()]);

        let (strict, repo) = engine(csv, true);
        assert!(strict.run().await.is_err());
        assert_eq!(repo.count(deadline()).await.unwrap(), 0);
    }
}
