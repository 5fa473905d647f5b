//! Suite runner that scopes the browser session around the CRUD sequence

use std::path::PathBuf;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::browser::BrowserSession;
use crate::client::CrudClient;
use crate::config::SuiteConfig;
use crate::error::CrudResult;
use crate::record::BookRecord;
use crate::sequence::{CrudSequence, StageOutcome, StageResult};

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub collection_url: String,
    pub record_id: Option<String>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub stages: Vec<StageResult>,
}

impl SuiteResult {
    fn from_stages(collection_url: String, record: &BookRecord, stages: Vec<StageResult>, duration_ms: u64) -> Self {
        let count = |outcome: StageOutcome| stages.iter().filter(|s| s.outcome == outcome).count();
        Self {
            collection_url,
            record_id: record.id().map(String::from),
            total: stages.len(),
            passed: count(StageOutcome::Passed),
            failed: count(StageOutcome::Failed),
            skipped: count(StageOutcome::Skipped),
            duration_ms,
            stages,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Main suite runner
pub struct SuiteRunner {
    config: SuiteConfig,
}

impl SuiteRunner {
    pub fn new(config: SuiteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run the suite.
    ///
    /// The browser session, when enabled, is acquired before the first stage
    /// and released after the last one whatever the outcome. A launch failure
    /// aborts the run.
    pub async fn run(&self) -> CrudResult<SuiteResult> {
        let session = if self.config.browser.enabled {
            Some(BrowserSession::acquire(&self.config.browser).await?)
        } else {
            None
        };

        let result = self.run_sequence().await;

        if let Some(session) = session {
            if let Err(e) = session.close().await {
                warn!("Failed to close browser session: {}", e);
            }
        }

        result
    }

    /// Run only the CRUD sequence, without the browser fixture
    pub async fn run_sequence(&self) -> CrudResult<SuiteResult> {
        let start = Instant::now();
        let client = CrudClient::new(&self.config.api)?;
        let collection_url = client.collection_url().to_string();

        info!("Running CRUD sequence against {}", collection_url);

        let mut sequence = CrudSequence::new(
            client,
            BookRecord::new(self.config.record.clone()),
            self.config.update.clone(),
        )
        .with_strict_listing(self.config.api.strict_listing);

        let stages = sequence.run().await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let result = SuiteResult::from_stages(collection_url, sequence.record(), stages, duration_ms);

        info!("");
        if result.failed == 0 {
            info!(
                "Stage Results: {} passed, {} failed, {} skipped ({} ms)",
                result.passed, result.failed, result.skipped, result.duration_ms
            );
        } else {
            error!(
                "Stage Results: {} passed, {} failed, {} skipped ({} ms)",
                result.passed, result.failed, result.skipped, result.duration_ms
            );
        }

        Ok(result)
    }

    /// Write results to a JSON file in the output directory
    pub fn write_results(&self, result: &SuiteResult) -> CrudResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("crud-results.json");
        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
