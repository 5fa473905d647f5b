//! crudcheck - CRUD verification suite for hosted REST collections
//!
//! This crate drives an ordered create/list/update/delete sequence against a
//! hosted collection (crudcrud.com style) and can hold a headless browser
//! session open for the duration of the run:
//! - Sends typed JSON requests with reqwest and asserts on status and body
//! - Threads the created record's identifier through the later stages
//! - Stops at the first failing stage and reports the rest as skipped
//! - Spawns a WebDriver server and opens a maximized headless session
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SuiteRunner                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BrowserSession::launch()  ── DriverHandle (chromedriver)   │
//! │                                                             │
//! │  CrudSequence (owns BookRecord)                             │
//! │    ├── create  POST   /books          -> 201, store _id     │
//! │    ├── list    GET    /books          -> 200, non-empty     │
//! │    ├── update  PUT    /books/{id}     -> 200|204, re-fetch  │
//! │    └── delete  DELETE /books/{id}     -> 200|204, then 404  │
//! │                                                             │
//! │  BrowserSession::close()   (always)                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod record;
pub mod runner;
pub mod sequence;

pub use browser::{Browser, BrowserConfig, BrowserSession};
pub use client::{ApiConfig, ApiResponse, CrudClient};
pub use config::SuiteConfig;
pub use error::{CrudError, CrudResult};
pub use record::{BookFields, BookRecord};
pub use runner::{SuiteResult, SuiteRunner};
pub use sequence::{CrudSequence, Stage, StageOutcome, StageResult};
