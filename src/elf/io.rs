use super::class::{ElfClass, Field, Layout};
use super::error::{ElfError, format_error};
use memmap2::Mmap;

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;

pub const ELFDATA2LSB: u8 = 1;
pub const ELFDATA2MSB: u8 = 2;

/// Owns the mapped bytes and knows how to read them: which byte order to use and which
/// structure layout applies. Every read is checked against the length of the mapping.
pub struct Reader {
    pub little_endian: bool,
    pub class: ElfClass,
    bytes: Mmap,
}

impl Reader {
    /// Validates the magic number and resolves the class. Nothing past e_ident is
    /// interpreted here.
    pub fn new(bytes: Mmap) -> Result<Self, ElfError> {
        match bytes.get(0..4) {
            Some(magic) if magic == ELF_MAGIC => (),
            _ => return Err(format_error("not an ELF file (bad magic)")),
        }

        let ei_class = *bytes
            .get(EI_CLASS)
            .ok_or_else(|| format_error("file ends before EI_CLASS"))?;
        let class = ElfClass::from_u8(ei_class)?;

        let header_size = class.layout().header.size;
        if bytes.len() < header_size {
            return Err(format_error(format!(
                "file is {} bytes but an {} header needs {header_size}",
                bytes.len(),
                class.name()
            )));
        }

        let little_endian = match bytes[EI_DATA] {
            ELFDATA2LSB => true,
            ELFDATA2MSB => false,
            other => {
                log::warn!("unknown data encoding {other}, assuming little endian");
                true
            }
        };

        Ok(Reader {
            little_endian,
            class,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn layout(&self) -> &'static Layout {
        self.class.layout()
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&[u8], ElfError> {
        offset
            .checked_add(size)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| {
                format_error(format!(
                    "{size} bytes at offset {offset} are past the end of the file ({} bytes)",
                    self.bytes.len()
                ))
            })
    }

    pub fn read_byte(&self, offset: usize) -> Result<u8, ElfError> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_half(&self, offset: usize) -> Result<u16, ElfError> {
        let bytes = self.array::<2>(offset)?;
        if self.little_endian {
            Ok(u16::from_le_bytes(bytes))
        } else {
            Ok(u16::from_be_bytes(bytes))
        }
    }

    pub fn read_word(&self, offset: usize) -> Result<u32, ElfError> {
        let bytes = self.array::<4>(offset)?;
        if self.little_endian {
            Ok(u32::from_le_bytes(bytes))
        } else {
            Ok(u32::from_be_bytes(bytes))
        }
    }

    pub fn read_xword(&self, offset: usize) -> Result<u64, ElfError> {
        let bytes = self.array::<8>(offset)?;
        if self.little_endian {
            Ok(u64::from_le_bytes(bytes))
        } else {
            Ok(u64::from_be_bytes(bytes))
        }
    }

    /// Reads a field of a structure starting at base. The field's width comes from
    /// the layout so this works for both classes; the result is always widened to 64
    /// bits.
    pub fn read_field(&self, base: usize, field: Field) -> Result<u64, ElfError> {
        let offset = base
            .checked_add(field.offset)
            .ok_or_else(|| format_error(format!("structure offset {base} overflows")))?;
        match field.size {
            1 => Ok(self.read_byte(offset)? as u64),
            2 => Ok(self.read_half(offset)? as u64),
            4 => Ok(self.read_word(offset)? as u64),
            8 => self.read_xword(offset),
            n => Err(format_error(format!("unsupported field width {n}"))),
        }
    }

    /// Like read_field but sign extends, for d_tag and r_addend.
    pub fn read_signed_field(&self, base: usize, field: Field) -> Result<i64, ElfError> {
        let value = self.read_field(base, field)?;
        Ok(match field.size {
            1 => value as u8 as i8 as i64,
            2 => value as u16 as i16 as i64,
            4 => value as u32 as i32 as i64,
            _ => value as i64,
        })
    }

    /// Returns the bytes of the null-terminated string starting at offset, without the
    /// terminator. The terminator must appear before end.
    pub fn read_cstr(&self, offset: usize, end: usize) -> Result<&[u8], ElfError> {
        let end = end.min(self.bytes.len());
        let bytes = self
            .bytes
            .get(offset..end)
            .ok_or_else(|| format_error(format!("string offset {offset} is out of bounds")))?;
        match bytes.iter().position(|&b| b == 0) {
            Some(n) => Ok(&bytes[..n]),
            None => Err(format_error(format!(
                "string at offset {offset} is not null terminated"
            ))),
        }
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], ElfError> {
        let mut result = [0; N];
        result.copy_from_slice(self.slice(offset, N)?);
        Ok(result)
    }
}
