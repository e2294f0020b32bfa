//! [`ParticleStore`] backed by MCPL files.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use mcpl::{McplReader, McplWriter, Particle};

use crate::store::{Features, ParticleInput, ParticleOutput, ParticleRecord, ParticleStore};

/// Reads and writes `.mcpl` files through the [`mcpl`] crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct McplStore;

impl ParticleStore for McplStore {
    const EXTENSION: &'static str = ".mcpl";

    type Record = Particle;
    type Input = McplReader;
    type Output = McplWriter;

    fn open_input(&self, path: &Path) -> Result<McplReader> {
        Ok(McplReader::open(path)?)
    }

    fn create_output(&self, path: &Path) -> Result<McplWriter> {
        Ok(McplWriter::create(path)?)
    }
}

impl ParticleRecord for Particle {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

impl ParticleInput for McplReader {
    type Record = Particle;

    fn is_little_endian(&self) -> bool {
        self.header().endian.is_little()
    }

    fn source_name(&self) -> Result<&[u8]> {
        Ok(self.header().source_name.as_slice())
    }

    fn comment_count(&self) -> usize {
        self.header().comments.len()
    }

    fn comment(&self, index: usize) -> Result<&[u8]> {
        self.header()
            .comments
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("comment index {index} out of range"))
    }

    fn blob_keys(&self) -> Vec<&[u8]> {
        self.header().blob_keys().collect()
    }

    fn blob(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        Ok(self.header().blob(key))
    }

    fn features(&self) -> Features {
        let layout = &self.header().layout;
        Features {
            userflags: layout.userflags,
            polarisation: layout.polarisation,
            double_precision: !layout.single_precision,
        }
    }

    fn universal_pdg_code(&self) -> Option<i32> {
        self.header().layout.universal_pdg_code
    }

    fn universal_weight(&self) -> Option<f64> {
        self.header().layout.universal_weight
    }

    fn read_record(&mut self) -> Result<Option<Particle>> {
        Ok(self.read_particle()?)
    }

    fn close(self) {
        McplReader::close(self);
    }
}

impl ParticleOutput for McplWriter {
    type Record = Particle;

    fn set_source_name(&mut self, name: &[u8]) -> Result<()> {
        Ok(McplWriter::set_source_name(self, name)?)
    }

    fn add_comment(&mut self, comment: &[u8]) -> Result<()> {
        Ok(McplWriter::add_comment(self, comment)?)
    }

    fn add_blob(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        Ok(McplWriter::add_blob(self, key, data)?)
    }

    fn enable_features(&mut self, features: Features) -> Result<()> {
        if features.userflags {
            self.enable_userflags()?;
        }
        if features.polarisation {
            self.enable_polarisation()?;
        }
        if features.double_precision {
            self.enable_double_precision()?;
        }
        Ok(())
    }

    fn set_universal_pdg_code(&mut self, code: i32) -> Result<()> {
        Ok(McplWriter::set_universal_pdg_code(self, code)?)
    }

    fn set_universal_weight(&mut self, weight: f64) -> Result<()> {
        Ok(McplWriter::set_universal_weight(self, weight)?)
    }

    fn append(&mut self, record: &Particle) -> Result<()> {
        Ok(self.add_particle(record)?)
    }

    fn close(self) -> Result<PathBuf> {
        Ok(McplWriter::close(self)?)
    }

    fn close_and_gzip(self) -> Result<PathBuf> {
        Ok(McplWriter::close_and_gzip(self)?)
    }

    fn abandon(self) -> Result<()> {
        Ok(McplWriter::abandon(self)?)
    }
}
