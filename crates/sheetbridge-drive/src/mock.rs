//! Mock conversion service for testing
//!
//! Holds files in memory, scripts failures per operation and records every
//! call so tests can assert on the exact remote traffic.

use crate::error::{Error, Result};
use crate::service::ConversionService;
use crate::types::{FileMetadata, UploadMetadata, GOOGLE_SHEET_MIME};

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Remote operation kinds, used to script failures and inspect calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `metadata`
    Metadata,
    /// `spreadsheet_metadata`
    SpreadsheetMetadata,
    /// `find_conversion`
    FindConversion,
    /// `convert`
    Convert,
    /// `download`
    Download,
    /// `upload`
    Upload,
    /// `delete`
    Delete,
}

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Operation invoked
    pub operation: Operation,
    /// File id or name the call targeted
    pub target: String,
}

#[derive(Debug, Clone)]
struct StoredFile {
    metadata: FileMetadata,
    content: Vec<u8>,
}

/// An in-memory [`ConversionService`] with scripted failures.
#[derive(Debug, Default)]
pub struct MockConversionService {
    files: Mutex<HashMap<String, StoredFile>>,
    queued_failures: Mutex<HashMap<Operation, VecDeque<Error>>>,
    persistent_failures: Mutex<HashMap<Operation, Error>>,
    failing_deletes: Mutex<HashSet<String>>,
    calls: Mutex<Vec<MockCall>>,
    next_id: AtomicU64,
}

impl MockConversionService {
    /// Create an empty mock service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file with its content.
    pub fn add_file(&self, metadata: FileMetadata, content: Vec<u8>) {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(metadata.id.clone(), StoredFile { metadata, content });
    }

    /// Fail the next call of `operation` with `error` (queued, one per call).
    pub fn push_failure(&self, operation: Operation, error: Error) {
        self.queued_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Fail every call of `operation` with `error` once the queue is drained.
    pub fn fail_always(&self, operation: Operation, error: Error) {
        self.persistent_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(operation, error);
    }

    /// Make deleting `file_id` fail with a permission error.
    pub fn fail_delete_of(&self, file_id: impl Into<String>) {
        self.failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(file_id.into());
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Targets of all calls of `operation`, in order.
    #[must_use]
    pub fn calls_for(&self, operation: Operation) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.target)
            .collect()
    }

    /// Whether a file currently exists.
    #[must_use]
    pub fn contains(&self, file_id: &str) -> bool {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(file_id)
    }

    /// Metadata of a stored file.
    #[must_use]
    pub fn file(&self, file_id: &str) -> Option<FileMetadata> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(file_id)
            .map(|f| f.metadata.clone())
    }

    /// Content of a stored file.
    #[must_use]
    pub fn content(&self, file_id: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(file_id)
            .map(|f| f.content.clone())
    }

    fn begin(&self, operation: Operation, target: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockCall {
                operation,
                target: target.to_string(),
            });

        let queued = self
            .queued_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        if let Some(err) = queued {
            return Err(err);
        }
        match self
            .persistent_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&operation)
        {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn stored(&self, file_id: &str) -> Result<StoredFile> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("File not found: {file_id}")))
    }

    fn create(&self, prefix: &str, metadata: FileMetadata, content: Vec<u8>) -> String {
        let id = format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let metadata = FileMetadata { id: id.clone(), ..metadata };
        self.add_file(metadata, content);
        id
    }
}

#[async_trait::async_trait]
impl ConversionService for MockConversionService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn metadata(&self, file_id: &str) -> Result<FileMetadata> {
        self.begin(Operation::Metadata, file_id)?;
        Ok(self.stored(file_id)?.metadata)
    }

    async fn spreadsheet_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        self.begin(Operation::SpreadsheetMetadata, file_id)?;
        let file = self.stored(file_id)?;
        if !file.metadata.is_google_sheet() {
            return Err(Error::NotFound(format!("Not a spreadsheet: {file_id}")));
        }
        Ok(file.metadata)
    }

    async fn find_conversion(
        &self,
        base_name: &str,
        parent: Option<&str>,
    ) -> Result<Option<String>> {
        self.begin(Operation::FindConversion, base_name)?;
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        let mut matches: Vec<&FileMetadata> = files
            .values()
            .map(|f| &f.metadata)
            .filter(|m| m.is_google_sheet() && m.name.contains(base_name))
            .filter(|m| parent.map_or(true, |p| m.parents.iter().any(|x| x == p)))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches.last().map(|m| m.id.clone()))
    }

    async fn convert(&self, file_id: &str, name: &str) -> Result<String> {
        self.begin(Operation::Convert, file_id)?;
        let source = self.stored(file_id)?;
        let metadata = FileMetadata {
            id: String::new(),
            name: name.to_string(),
            mime_type: GOOGLE_SHEET_MIME.to_string(),
            size: None,
            parents: source.metadata.parents.clone(),
        };
        Ok(self.create("converted", metadata, source.content))
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.begin(Operation::Download, file_id)?;
        Ok(self.stored(file_id)?.content)
    }

    async fn upload(&self, content: &[u8], metadata: &UploadMetadata) -> Result<String> {
        self.begin(Operation::Upload, &metadata.name)?;
        let stored = FileMetadata {
            id: String::new(),
            name: metadata.name.clone(),
            mime_type: metadata.mime_type.clone(),
            size: Some(content.len() as u64),
            parents: metadata.parents.clone(),
        };
        Ok(self.create("uploaded", stored, content.to_vec()))
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        self.begin(Operation::Delete, file_id)?;
        if self
            .failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(file_id)
        {
            return Err(Error::PermissionDenied(format!(
                "The user does not have sufficient permissions for file {file_id}."
            )));
        }
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("File not found: {file_id}")))
    }
}
