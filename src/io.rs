//! Low-level cursor helpers shared by the message reader: seeking, bounded
//! sub-cursors, and compressed-name decompression.

use crate::bail;
use crate::name::{Label, Name};
use crate::types::{DNSClass, DNSType};
use byteorder::{ReadBytesExt, BE};
use num_traits::FromPrimitive;
use std::convert::TryInto;
use std::io;
use std::io::Cursor;
use std::io::SeekFrom;

pub fn clamp<T: PartialOrd>(v: T, min: T, max: T) -> T {
    assert!(min < max);

    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

pub trait SeekExt: io::Seek {
    /// Returns the number of bytes remaining to be consumed.
    fn remaining(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(len - pos)
    }
}

impl<'a> SeekExt for Cursor<&'a [u8]> {
    fn remaining(self: &mut std::io::Cursor<&'a [u8]>) -> io::Result<u64> {
        let pos = self.position() as usize;
        let len = self.get_ref().len() as usize;
        Ok((len - pos).try_into().unwrap())
    }
}

pub trait CursorExt<T> {
    /// Returns a cursor bounded over the original cursor by `start..end`.
    fn sub_cursor(&mut self, start: usize, end: usize) -> io::Result<std::io::Cursor<T>>;
}

impl<'a> CursorExt<&'a [u8]> for Cursor<&'a [u8]> {
    fn sub_cursor(&mut self, start: usize, end: usize) -> io::Result<std::io::Cursor<&'a [u8]>> {
        let buf = self.get_ref();
        let start = clamp(start, 0, buf.len());
        let end = clamp(end, start, buf.len());
        Ok(Cursor::new(&buf[start..end]))
    }
}

/// All types that implement `Read` and `Seek` get methods defined in
/// `DNSReadExt` for free.
impl<R: io::Read + ?Sized + io::Seek> DNSReadExt for R {}

/// Extensions to `io::Read` for DNS-specific wire values.
pub trait DNSReadExt: io::Read + io::Seek {
    /// Reads a (possibly compressed) domain name from a DNS message.
    ///
    /// Compression pointers must reference a strictly earlier offset than
    /// where the name itself started (`ptr < start`); equal or forward
    /// pointers are rejected, which also rules out pointer cycles.
    fn read_qname(&mut self) -> io::Result<Name> {
        let mut name = Name::root();
        let start = self.stream_position()?;

        loop {
            let len = self.read_u8()?;
            if len == 0 {
                break;
            }

            match len & 0xC0 {
                0x00 => {
                    let mut label = vec![0; len.into()];
                    self.read_exact(&mut label)?;
                    let label = match Label::new(label) {
                        Ok(l) => l,
                        Err(e) => bail!(InvalidData, "invalid label: {}", e),
                    };
                    name.push_back(label);
                }

                0xC0 => {
                    let b2 = self.read_u8()? as u16;
                    let ptr = ((len as u16 & !0xC0) << 8 | b2) as u64;

                    if ptr >= start {
                        bail!(
                            InvalidData,
                            "invalid compressed pointer pointing to future bytes"
                        );
                    }

                    let current = self.stream_position()?;
                    self.seek(SeekFrom::Start(ptr))?;
                    let suffix = self.read_qname()?;
                    self.seek(SeekFrom::Start(current))?;

                    for label in suffix.labels() {
                        name.push_back(label.clone());
                    }
                    break;
                }

                _ => bail!(InvalidData, "unsupported compression type {0:b}", len & 0xC0),
            }
        }

        if name.wire_len() > 255 {
            bail!(InvalidData, "name is longer than 255 bytes on the wire");
        }

        Ok(name)
    }

    fn read_dns_type(&mut self) -> io::Result<DNSType> {
        let t = self.read_u16::<BE>()?;
        match FromPrimitive::from_u16(t) {
            Some(t) => Ok(t),
            // Unrecognized type codes are handled by the caller via
            // `RRGen::Unknown`, not here; this path is only hit for values
            // outside u16 range, which cannot occur.
            None => bail!(InvalidData, "invalid type({})", t),
        }
    }

    fn read_dns_class(&mut self) -> io::Result<DNSClass> {
        let c = self.read_u16::<BE>()?;
        match FromPrimitive::from_u16(c) {
            Some(c) => Ok(c),
            None => bail!(InvalidData, "invalid class({})", c),
        }
    }
}
