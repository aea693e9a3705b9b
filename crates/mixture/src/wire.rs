use super::*;
use byteorder::BE;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use emgmm_core::*;
use std::io::Read;
use std::io::Write;

/// Versioned, fixed-order binary layout for [`SufficientStatistics`].
///
/// ```text
/// "GMMSS" | version u16 | components u32 | dim u32 | records u64
/// ss0[components] | ss1[components][dim] | ss2[components][dim]
/// log_likelihood | footer u16 (0xFFFF)
/// ```
///
/// All integers and reals are big-endian. This is the only form in which
/// statistics cross a partition or aggregation boundary; encoding and
/// decoding never alter the accumulated values.
impl SufficientStatistics {
    /// Signature identifying a serialized accumulator.
    pub fn header() -> &'static [u8] {
        b"GMMSS"
    }
    /// Trailer marking the end of a serialized accumulator.
    pub fn footer() -> u16 {
        0xFFFF
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(Self::header())?;
        writer.write_u16::<BE>(STATISTICS_VERSION)?;
        writer.write_u32::<BE>(self.components() as u32)?;
        writer.write_u32::<BE>(self.dim() as u32)?;
        writer.write_u64::<BE>(self.records() as u64)?;
        for x in self.ss0() {
            writer.write_f64::<BE>(*x)?;
        }
        for x in self.ss1().iter().flatten() {
            writer.write_f64::<BE>(*x)?;
        }
        for x in self.ss2().iter().flatten() {
            writer.write_f64::<BE>(*x)?;
        }
        writer.write_f64::<BE>(self.log_likelihood())?;
        writer.write_u16::<BE>(Self::footer())?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let truncated = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::MalformedStatistics("truncated".into()),
            _ => Error::Io(e),
        };
        let mut header = [0u8; 5];
        reader.read_exact(&mut header).map_err(truncated)?;
        if header != Self::header() {
            return Err(Error::MalformedStatistics("bad signature".into()));
        }
        let version = reader.read_u16::<BE>().map_err(truncated)?;
        if version != STATISTICS_VERSION {
            return Err(Error::MalformedStatistics(format!(
                "unsupported version {}",
                version
            )));
        }
        let components = reader.read_u32::<BE>().map_err(truncated)? as usize;
        let dim = reader.read_u32::<BE>().map_err(truncated)? as usize;
        if components == 0 || dim == 0 {
            return Err(Error::MalformedStatistics(format!(
                "empty shape {}x{}",
                components, dim
            )));
        }
        let records = reader.read_u64::<BE>().map_err(truncated)? as usize;
        let ref mut row = |n: usize| -> Result<Vec<Feature>> {
            (0..n)
                .map(|_| reader.read_f64::<BE>().map_err(truncated))
                .collect()
        };
        let ss0 = row(components)?;
        let ss1 = (0..components)
            .map(|_| row(dim))
            .collect::<Result<Vec<Vec<Feature>>>>()?;
        let ss2 = (0..components)
            .map(|_| row(dim))
            .collect::<Result<Vec<Vec<Feature>>>>()?;
        let log_likelihood = reader.read_f64::<BE>().map_err(truncated)?;
        if reader.read_u16::<BE>().map_err(truncated)? != Self::footer() {
            return Err(Error::MalformedStatistics("bad footer".into()));
        }
        Self::from_parts(records, ss0, ss1, ss2, log_likelihood)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Decodes exactly one accumulator; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let ref mut cursor = std::io::Cursor::new(bytes);
        let stats = Self::read_from(cursor)?;
        if (cursor.position() as usize) < bytes.len() {
            return Err(Error::MalformedStatistics(format!(
                "{} trailing bytes",
                bytes.len() - cursor.position() as usize
            )));
        }
        Ok(stats)
    }

    fn byte_len(&self) -> usize {
        Self::header().len() + 2 + 4 + 4 + 8 + 8 * (self.components() * (1 + 2 * self.dim()) + 1) + 2
    }
}
