//! In-memory particle store for driving the engine in tests.
//!
//! Files live in a shared map keyed by path. Handles log what happens to them
//! (`open`, `create`, `release`, `close`, `gzip`, `abandon`) so tests can
//! check ordering and that every handle is released exactly once. Faults can
//! be injected per file (unreadable comments or blobs, read failures) and per
//! store (create, append and finalize failures).

use crate::*;
use anyhow::{anyhow, bail, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rec {
    pub id: u32,
    pub weight: f64,
}

impl ParticleRecord for Rec {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemFile {
    pub little_endian: bool,
    pub source_name: Vec<u8>,
    /// `Err` marks a comment that fails to read.
    pub comments: Vec<Result<Vec<u8>, String>>,
    /// `Err` marks a blob that fails to read.
    pub blobs: Vec<(Vec<u8>, Result<Vec<u8>, String>)>,
    pub features: Features,
    pub universal_pdg_code: Option<i32>,
    pub universal_weight: Option<f64>,
    pub records: Vec<Rec>,
    /// Reading fails once this many records have been returned.
    pub fail_read_after: Option<usize>,
}

impl Default for MemFile {
    fn default() -> Self {
        Self {
            little_endian: cfg!(target_endian = "little"),
            source_name: Vec::new(),
            comments: Vec::new(),
            blobs: Vec::new(),
            features: Features::default(),
            universal_pdg_code: None,
            universal_weight: None,
            records: Vec::new(),
            fail_read_after: None,
        }
    }
}

impl MemFile {
    /// A file with a stored particle count and one record per weight. Record
    /// ids start at `first_id`.
    pub fn counted(count: u64, first_id: u32, weights: &[f64]) -> Self {
        let mut file = Self::default();
        file.blobs
            .push((COUNT_KEY.into(), Ok(encode_count(count).to_vec())));
        file.records = weights
            .iter()
            .enumerate()
            .map(|(i, &weight)| Rec {
                id: first_id + i as u32,
                weight,
            })
            .collect();
        file
    }

    pub fn blob(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        let key = key.as_ref();
        self.blobs
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .and_then(|(_, v)| v.as_ref().ok())
            .map(Vec::as_slice)
    }

    pub fn comment_texts(&self) -> Vec<&[u8]> {
        self.comments
            .iter()
            .filter_map(|c| c.as_deref().ok())
            .collect()
    }

    pub fn stored_count(&self) -> Option<u64> {
        self.blob(COUNT_KEY).and_then(|b| decode_count(b).ok())
    }
}

#[derive(Default)]
struct Shared {
    files: RefCell<BTreeMap<PathBuf, MemFile>>,
    events: RefCell<Vec<String>>,
    fail_create: Cell<bool>,
    fail_finalize: Cell<bool>,
    fail_append_after: Cell<Option<usize>>,
}

impl Shared {
    fn log(&self, event: &str, path: &Path) {
        self.events
            .borrow_mut()
            .push(format!("{event} {}", path.display()));
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Rc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, file: MemFile) {
        self.shared.files.borrow_mut().insert(path.into(), file);
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<MemFile> {
        self.shared.files.borrow().get(path.as_ref()).cloned()
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.shared.files.borrow().contains_key(path.as_ref())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.shared.files.borrow().keys().cloned().collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.shared.events.borrow().clone()
    }

    /// Number of logged events equal to `event`.
    pub fn count_events(&self, event: &str) -> usize {
        self.shared
            .events
            .borrow()
            .iter()
            .filter(|e| e.as_str() == event)
            .count()
    }

    pub fn fail_create(&self) {
        self.shared.fail_create.set(true);
    }

    pub fn fail_finalize(&self) {
        self.shared.fail_finalize.set(true);
    }

    pub fn fail_append_after(&self, records: usize) {
        self.shared.fail_append_after.set(Some(records));
    }
}

impl ParticleStore for MemoryStore {
    const EXTENSION: &'static str = ".mem";

    type Record = Rec;
    type Input = MemInput;
    type Output = MemOutput;

    fn open_input(&self, path: &Path) -> Result<MemInput> {
        let file = self
            .file(path)
            .ok_or_else(|| anyhow!("no such file: {}", path.display()))?;
        self.shared.log("open", path);
        Ok(MemInput {
            path: path.to_path_buf(),
            file,
            position: 0,
            shared: Rc::clone(&self.shared),
        })
    }

    fn create_output(&self, path: &Path) -> Result<MemOutput> {
        if self.shared.fail_create.get() {
            bail!("permission denied");
        }
        self.insert(path, MemFile::default());
        self.shared.log("create", path);
        Ok(MemOutput {
            path: path.to_path_buf(),
            file: MemFile::default(),
            frozen: false,
            shared: Rc::clone(&self.shared),
        })
    }
}

pub struct MemInput {
    path: PathBuf,
    file: MemFile,
    position: usize,
    shared: Rc<Shared>,
}

impl Drop for MemInput {
    fn drop(&mut self) {
        self.shared.log("release", &self.path);
    }
}

impl ParticleInput for MemInput {
    type Record = Rec;

    fn is_little_endian(&self) -> bool {
        self.file.little_endian
    }

    fn source_name(&self) -> Result<&[u8]> {
        Ok(self.file.source_name.as_slice())
    }

    fn comment_count(&self) -> usize {
        self.file.comments.len()
    }

    fn comment(&self, index: usize) -> Result<&[u8]> {
        match self.file.comments.get(index) {
            Some(Ok(comment)) => Ok(comment.as_slice()),
            Some(Err(e)) => Err(anyhow!("{e}")),
            None => Err(anyhow!("no comment {index}")),
        }
    }

    fn blob_keys(&self) -> Vec<&[u8]> {
        self.file.blobs.iter().map(|(k, _)| k.as_slice()).collect()
    }

    fn blob(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        match self.file.blobs.iter().find(|(k, _)| k.as_slice() == key) {
            Some((_, Ok(data))) => Ok(Some(data.as_slice())),
            Some((_, Err(e))) => Err(anyhow!("{e}")),
            None => Ok(None),
        }
    }

    fn features(&self) -> Features {
        self.file.features
    }

    fn universal_pdg_code(&self) -> Option<i32> {
        self.file.universal_pdg_code
    }

    fn universal_weight(&self) -> Option<f64> {
        self.file.universal_weight
    }

    fn read_record(&mut self) -> Result<Option<Rec>> {
        if self.file.fail_read_after == Some(self.position) {
            bail!("unexpected end of file");
        }
        let record = self.file.records.get(self.position).copied();
        if record.is_some() {
            self.position += 1;
        }
        Ok(record)
    }

    fn close(self) {}
}

pub struct MemOutput {
    path: PathBuf,
    file: MemFile,
    frozen: bool,
    shared: Rc<Shared>,
}

impl MemOutput {
    fn header(&mut self) -> Result<&mut MemFile> {
        if self.frozen {
            bail!("header is frozen");
        }
        Ok(&mut self.file)
    }

    fn store(&self, path: PathBuf) {
        self.shared.files.borrow_mut().insert(path, self.file.clone());
    }
}

impl ParticleOutput for MemOutput {
    type Record = Rec;

    fn set_source_name(&mut self, name: &[u8]) -> Result<()> {
        self.header()?.source_name = name.to_vec();
        Ok(())
    }

    fn add_comment(&mut self, comment: &[u8]) -> Result<()> {
        self.header()?.comments.push(Ok(comment.to_vec()));
        Ok(())
    }

    fn add_blob(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        let header = self.header()?;
        if header.blobs.iter().any(|(k, _)| k.as_slice() == key) {
            bail!("duplicate blob key {:?}", String::from_utf8_lossy(key));
        }
        header.blobs.push((key.to_vec(), Ok(data.to_vec())));
        Ok(())
    }

    fn enable_features(&mut self, features: Features) -> Result<()> {
        let header = self.header()?;
        header.features.userflags |= features.userflags;
        header.features.polarisation |= features.polarisation;
        header.features.double_precision |= features.double_precision;
        Ok(())
    }

    fn set_universal_pdg_code(&mut self, code: i32) -> Result<()> {
        self.header()?.universal_pdg_code = Some(code);
        Ok(())
    }

    fn set_universal_weight(&mut self, weight: f64) -> Result<()> {
        self.header()?.universal_weight = Some(weight);
        Ok(())
    }

    fn append(&mut self, record: &Rec) -> Result<()> {
        if self.shared.fail_append_after.get() == Some(self.file.records.len()) {
            bail!("disk full");
        }
        self.frozen = true;
        self.file.records.push(*record);
        Ok(())
    }

    fn close(self) -> Result<PathBuf> {
        if self.shared.fail_finalize.get() {
            bail!("close failed");
        }
        self.store(self.path.clone());
        self.shared.log("close", &self.path);
        Ok(self.path.clone())
    }

    fn close_and_gzip(self) -> Result<PathBuf> {
        self.store(self.path.clone());
        if self.shared.fail_finalize.get() {
            bail!("compression failed");
        }
        let mut gz = self.path.clone().into_os_string();
        gz.push(".gz");
        let gz = PathBuf::from(gz);
        self.shared.files.borrow_mut().remove(&self.path);
        self.store(gz.clone());
        self.shared.log("gzip", &self.path);
        Ok(gz)
    }

    fn abandon(self) -> Result<()> {
        self.shared.files.borrow_mut().remove(&self.path);
        self.shared.log("abandon", &self.path);
        Ok(())
    }
}

/// Ids of the file's records, in order.
pub fn ids(file: &MemFile) -> Vec<u32> {
    file.records.iter().map(|r| r.id).collect()
}

pub fn weights(file: &MemFile) -> Vec<f64> {
    file.records.iter().map(|r| r.weight).collect()
}
