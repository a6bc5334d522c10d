//! Shared fakes for integration tests
#![allow(dead_code)]

use capture_session::commit::Compressor;
use capture_session::edit::{JobControl, ToolError, VideoTool};
use capture_session::session::{AssetKind, CaptureSession, SessionConfig, SessionEvent};
use capture_session::storage::{DirectoryStorage, MediaIndex, SaveStrategy, StorageConfig};
use capture_session::utils::error::{CaptureError, CaptureResult};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Video tool that concatenates bytes and can be held, failed or cancelled
#[derive(Default)]
pub struct FakeVideoTool {
    /// Keep jobs running until `release` is called
    hold: AtomicBool,
    fail_with: Mutex<Option<String>>,
    pub runs: AtomicUsize,
}

impl FakeVideoTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn held() -> Arc<Self> {
        let tool = Self::default();
        tool.hold.store(true, Ordering::SeqCst);
        Arc::new(tool)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        let tool = Self::default();
        *tool.fail_with.lock() = Some(message.to_string());
        Arc::new(tool)
    }

    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
    }

    fn wait_released(&self, control: &JobControl) -> Result<(), ToolError> {
        while self.hold.load(Ordering::SeqCst) {
            if control.is_cancelled() {
                return Err(ToolError::Cancelled);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    }

    fn produce(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        control: &mut JobControl,
    ) -> Result<(), ToolError> {
        self.runs.fetch_add(1, Ordering::SeqCst);

        let mut bytes = Vec::new();
        for (i, input) in inputs.iter().enumerate() {
            bytes.extend(fs::read(input)?);
            // partial output, as a real encoder would leave behind
            fs::write(output, &bytes)?;
            control.report((i + 1) as f64 / (inputs.len() + 1) as f64);
        }

        self.wait_released(control)?;

        if let Some(message) = self.fail_with.lock().clone() {
            return Err(ToolError::Failed(message));
        }
        control.report(1.0);
        fs::write(output, bytes)?;
        Ok(())
    }
}

impl VideoTool for FakeVideoTool {
    fn concat(
        &self,
        _manifest: &Path,
        segments: &[PathBuf],
        output: &Path,
        control: &mut JobControl,
    ) -> Result<(), ToolError> {
        self.produce(segments, output, control)
    }

    fn compress(
        &self,
        input: &Path,
        output: &Path,
        control: &mut JobControl,
    ) -> Result<(), ToolError> {
        self.produce(&[input.to_path_buf()], output, control)?;
        let mut bytes = fs::read(output)?;
        bytes.extend_from_slice(b"-small");
        fs::write(output, bytes)?;
        Ok(())
    }
}

/// Photo compressor that writes a `.min` sibling
#[derive(Default)]
pub struct FakeCompressor {
    pub calls: AtomicUsize,
}

impl Compressor for FakeCompressor {
    fn compress_file(&self, path: &Path) -> CaptureResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = fs::read(path).map_err(|e| CaptureError::io(path, e))?;
        let output = path.with_extension("min.jpg");
        fs::write(&output, &bytes[..bytes.len().min(4)]).map_err(|e| CaptureError::io(&output, e))?;
        Ok(output)
    }
}

/// Media index that remembers registrations and can fail the n-th one
#[derive(Default)]
pub struct RecordingMediaIndex {
    pub registered: Mutex<Vec<(PathBuf, AssetKind)>>,
    /// 1-based call number that fails
    fail_on: Mutex<Option<usize>>,
    calls: AtomicUsize,
    /// Block inside `register` until `release` is called
    hold: AtomicBool,
}

impl RecordingMediaIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(call: usize) -> Arc<Self> {
        let index = Self::default();
        *index.fail_on.lock() = Some(call);
        Arc::new(index)
    }

    pub fn held() -> Arc<Self> {
        let index = Self::default();
        index.hold.store(true, Ordering::SeqCst);
        Arc::new(index)
    }

    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
    }

    /// Number of `register` calls that have started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until `register` has been entered `count` times
    pub async fn wait_for_calls(&self, count: usize) {
        while self.calls() < count {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    pub fn stop_failing(&self) {
        *self.fail_on.lock() = None;
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.registered.lock().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl MediaIndex for RecordingMediaIndex {
    fn register(&self, path: &Path, kind: AssetKind) -> CaptureResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        while self.hold.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(2));
        }
        if *self.fail_on.lock() == Some(call) {
            return Err(CaptureError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "media index refused"),
            ));
        }
        self.registered.lock().push((path.to_path_buf(), kind));
        Ok(())
    }
}

/// Scratch and permanent directories under one temp dir
pub struct Dirs {
    pub root: TempDir,
    pub scratch: PathBuf,
    pub permanent: PathBuf,
}

impl Dirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("scratch");
        let permanent = root.path().join("permanent");
        fs::create_dir_all(&scratch).unwrap();
        Self {
            root,
            scratch,
            permanent,
        }
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            scratch_dir: self.scratch.clone(),
            save_strategy: Some(SaveStrategy::new(&self.permanent)),
            picture_strategy: None,
            video_strategy: None,
        }
    }

    pub fn storage(&self) -> Arc<DirectoryStorage> {
        Arc::new(DirectoryStorage::new(self.storage_config()).unwrap())
    }

    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            storage: self.storage_config(),
            ..SessionConfig::default()
        }
    }

    /// Files currently in the scratch directory
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        list_files(&self.scratch)
    }

    pub fn permanent_files(&self) -> Vec<PathBuf> {
        list_files(&self.permanent)
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}

pub struct Harness {
    pub dirs: Dirs,
    pub session: CaptureSession,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub tool: Arc<FakeVideoTool>,
    pub index: Arc<RecordingMediaIndex>,
}

impl Harness {
    pub fn new(configure: impl FnOnce(&mut SessionConfig)) -> Self {
        Self::with_parts(configure, FakeVideoTool::new(), RecordingMediaIndex::new(), None)
    }

    pub fn with_parts(
        configure: impl FnOnce(&mut SessionConfig),
        tool: Arc<FakeVideoTool>,
        index: Arc<RecordingMediaIndex>,
        compressor: Option<Arc<dyn Compressor>>,
    ) -> Self {
        let dirs = Dirs::new();
        let mut config = dirs.config();
        configure(&mut config);
        let (session, events) = CaptureSession::new(
            config,
            Some(tool.clone() as Arc<dyn VideoTool>),
            compressor,
            index.clone(),
        )
        .unwrap();
        Self {
            dirs,
            session,
            events,
            tool,
            index,
        }
    }

    /// Start a recording and have the "camera" write `bytes` into it
    pub fn record(&mut self, bytes: &[u8]) -> PathBuf {
        let path = self.session.start_recording().unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    /// Events emitted so far
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
