use std::io::{self, Read};

use crate::format::{Endian, Layout};
use crate::McplError;

/// One particle record, widened to `f64` fields.
///
/// `ekindir` holds the packed kinetic energy and direction exactly as stored
/// in the file. It is carried through unchanged and never unpacked, so a
/// record decoded and re-encoded with the same layout reproduces its original
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    /// Polarisation vector; zero when the layout has no polarisation.
    pub polarisation: [f64; 3],
    pub position: [f64; 3],
    /// Packed kinetic energy and unit direction.
    pub ekindir: [f64; 3],
    pub time: f64,
    pub weight: f64,
    pub pdg_code: i32,
    /// User flags; zero when the layout has no user flags.
    pub userflags: u32,
}

impl Particle {
    /// Decodes one record of `layout.particle_size()` bytes.
    ///
    /// Universal values from the layout fill in the omitted fields.
    pub fn decode(bytes: &[u8], layout: &Layout, endian: Endian) -> Result<Self, McplError> {
        if bytes.len() != layout.particle_size() {
            return Err(McplError::Corrupt(format!(
                "particle record is {} bytes, layout requires {}",
                bytes.len(),
                layout.particle_size()
            )));
        }
        let mut r = bytes;
        let mut p = Particle::default();

        if layout.polarisation {
            for v in p.polarisation.iter_mut() {
                *v = read_fp(&mut r, layout, endian)?;
            }
        }
        for v in p.position.iter_mut() {
            *v = read_fp(&mut r, layout, endian)?;
        }
        for v in p.ekindir.iter_mut() {
            *v = read_fp(&mut r, layout, endian)?;
        }
        p.time = read_fp(&mut r, layout, endian)?;
        p.weight = match layout.universal_weight {
            Some(w) => w,
            None => read_fp(&mut r, layout, endian)?,
        };
        p.pdg_code = match layout.universal_pdg_code {
            Some(code) => code,
            None => endian.read_i32(&mut r)?,
        };
        if layout.userflags {
            p.userflags = endian.read_u32(&mut r)?;
        }
        Ok(p)
    }

    /// Appends the encoding of this particle under `layout` to `out`.
    ///
    /// Fields the layout omits are dropped; a weight or pdg code that differs
    /// from a declared universal value is rejected.
    pub fn encode(&self, layout: &Layout, endian: Endian, out: &mut Vec<u8>) -> Result<(), McplError> {
        if let Some(universal) = layout.universal_weight {
            if self.weight != universal {
                return Err(McplError::WeightNotUniversal {
                    weight: self.weight,
                    universal,
                });
            }
        }
        if let Some(universal) = layout.universal_pdg_code {
            if self.pdg_code != universal {
                return Err(McplError::PdgNotUniversal {
                    pdg_code: self.pdg_code,
                    universal,
                });
            }
        }

        if layout.polarisation {
            for v in self.polarisation {
                write_fp(out, v, layout, endian)?;
            }
        }
        for v in self.position.iter().chain(&self.ekindir) {
            write_fp(out, *v, layout, endian)?;
        }
        write_fp(out, self.time, layout, endian)?;
        if layout.universal_weight.is_none() {
            write_fp(out, self.weight, layout, endian)?;
        }
        if layout.universal_pdg_code.is_none() {
            endian.write_i32(out, self.pdg_code)?;
        }
        if layout.userflags {
            endian.write_u32(out, self.userflags)?;
        }
        Ok(())
    }
}

fn read_fp<R: Read>(r: &mut R, layout: &Layout, endian: Endian) -> io::Result<f64> {
    if layout.single_precision {
        Ok(f64::from(endian.read_f32(r)?))
    } else {
        endian.read_f64(r)
    }
}

fn write_fp(out: &mut Vec<u8>, value: f64, layout: &Layout, endian: Endian) -> io::Result<()> {
    if layout.single_precision {
        endian.write_f32(out, value as f32)
    } else {
        endian.write_f64(out, value)
    }
}
