//! Ordered create/list/update/delete verification

use std::fmt;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::client::{ApiResponse, CrudClient};
use crate::error::{CrudError, CrudResult};
use crate::record::{BookFields, BookRecord};

/// One stage of the sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Create,
    List,
    Update,
    Delete,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [Stage::Create, Stage::List, Stage::Update, Stage::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Create => "create",
            Stage::List => "list",
            Stage::Update => "update",
            Stage::Delete => "delete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Passed,
    Failed,
    Skipped,
}

/// Result of executing a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub duration_ms: u64,
    pub exchanges: Vec<ApiResponse>,
    pub error: Option<String>,
}

impl StageResult {
    fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Skipped,
            duration_ms: 0,
            exchanges: Vec::new(),
            error: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == StageOutcome::Passed
    }
}

/// Runs the four stages against one collection, threading the record through them.
///
/// The first failing stage ends the run; the remaining stages are reported
/// as skipped.
pub struct CrudSequence {
    client: CrudClient,
    record: BookRecord,
    replacement: BookFields,
    strict_listing: bool,
}

impl CrudSequence {
    pub fn new(client: CrudClient, record: BookRecord, replacement: BookFields) -> Self {
        Self {
            client,
            record,
            replacement,
            strict_listing: false,
        }
    }

    /// Require the created record to be present in the listing
    pub fn with_strict_listing(mut self, strict: bool) -> Self {
        self.strict_listing = strict;
        self
    }

    pub fn record(&self) -> &BookRecord {
        &self.record
    }

    /// Run every stage in order
    pub async fn run(&mut self) -> Vec<StageResult> {
        let mut results = Vec::with_capacity(Stage::ORDER.len());
        let mut failed = false;

        for stage in Stage::ORDER {
            if failed {
                debug!("Skipping {} after earlier failure", stage);
                results.push(StageResult::skipped(stage));
                continue;
            }

            let result = self.run_stage(stage).await;
            if result.passed() {
                info!("✓ {} ({} ms)", stage, result.duration_ms);
            } else {
                failed = true;
                error!("✗ {} - {}", stage, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        results
    }

    /// Run a single stage and capture its outcome
    pub async fn run_stage(&mut self, stage: Stage) -> StageResult {
        let start = Instant::now();
        let mut exchanges = Vec::new();

        info!("");
        info!("Running stage: {}", stage);

        let result = match stage {
            Stage::Create => self.create(&mut exchanges).await,
            Stage::List => self.list(&mut exchanges).await,
            Stage::Update => self.update(&mut exchanges).await,
            Stage::Delete => self.delete(&mut exchanges).await,
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => StageResult {
                stage,
                outcome: StageOutcome::Passed,
                duration_ms,
                exchanges,
                error: None,
            },
            Err(e) => StageResult {
                stage,
                outcome: StageOutcome::Failed,
                duration_ms,
                exchanges,
                error: Some(e.to_string()),
            },
        }
    }

    async fn create(&mut self, exchanges: &mut Vec<ApiResponse>) -> CrudResult<()> {
        let resp = self.client.create(&self.record.fields).await?;
        exchanges.push(resp.clone());
        resp.expect_status("create", &[201])?;

        let body: serde_json::Value = resp.json()?;
        let id = body
            .get("_id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                CrudError::AssertionFailed(format!("Book creation failed: {}", resp.body))
            })?;

        self.record.id = Some(id.to_string());
        info!("Book created successfully with ID: {}", id);
        Ok(())
    }

    async fn list(&mut self, exchanges: &mut Vec<ApiResponse>) -> CrudResult<()> {
        let resp = self.client.list().await?;
        exchanges.push(resp.clone());
        resp.expect_status("list", &[200])?;

        let body: serde_json::Value = resp.json()?;
        let books = body.as_array().ok_or_else(|| {
            CrudError::AssertionFailed(format!("listing is not an array: {}", resp.body))
        })?;

        if books.is_empty() {
            return Err(CrudError::AssertionFailed("listing is empty".to_string()));
        }

        if self.strict_listing {
            let id = self.require_id(Stage::List)?;
            let present = books
                .iter()
                .any(|b| b.get("_id").and_then(|v| v.as_str()) == Some(id));
            if !present {
                return Err(CrudError::AssertionFailed(format!(
                    "created book {} missing from listing",
                    id
                )));
            }
        }

        info!("List of Books: {} record(s)", books.len());
        Ok(())
    }

    async fn update(&mut self, exchanges: &mut Vec<ApiResponse>) -> CrudResult<()> {
        let id = self.require_id(Stage::Update)?.to_string();

        let resp = self.client.update(&id, &self.replacement).await?;
        exchanges.push(resp.clone());
        resp.expect_status("update", &[200, 204])?;

        let resp = self.client.get(&id).await?;
        exchanges.push(resp.clone());
        resp.expect_status("fetch after update", &[200])?;

        let book: BookRecord = resp.json()?;
        let expected = &self.replacement;
        if book.fields.title != expected.title {
            return Err(CrudError::AssertionFailed(format!(
                "title is {:?}, expected {:?}",
                book.fields.title, expected.title
            )));
        }
        if book.fields.author != expected.author {
            return Err(CrudError::AssertionFailed(format!(
                "author is {:?}, expected {:?}",
                book.fields.author, expected.author
            )));
        }
        if book.fields.year != expected.year {
            return Err(CrudError::AssertionFailed(format!(
                "year is {}, expected {}",
                book.fields.year, expected.year
            )));
        }

        info!("Updated Book: {:?}", book.fields);
        Ok(())
    }

    async fn delete(&mut self, exchanges: &mut Vec<ApiResponse>) -> CrudResult<()> {
        let id = self.require_id(Stage::Delete)?.to_string();

        let resp = self.client.delete(&id).await?;
        exchanges.push(resp.clone());
        resp.expect_status("delete", &[200, 204])?;

        let resp = self.client.get(&id).await?;
        exchanges.push(resp.clone());
        resp.expect_status("fetch after delete", &[404])?;

        info!("Book Deleted: {}", id);
        Ok(())
    }

    fn require_id(&self, stage: Stage) -> CrudResult<&str> {
        self.record
            .id()
            .ok_or_else(|| CrudError::MissingIdentifier(stage.to_string()))
    }
}
