use arrow_buffer::bit_util;

/// A growable bit vector in Arrow's layout, one bit per row.
///
/// Bits are least-significant first within each byte; bits past `len` are
/// always zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitmap {
    bytes: Vec<u8>,
    len: usize,
}

impl Bitmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_len(len: usize, value: bool) -> Self {
        let mut bitmap = Self::new();
        bitmap.resize(len, value);
        bitmap
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, idx: usize) -> bool {
        idx < self.len && bit_util::get_bit(&self.bytes, idx)
    }

    /// Out-of-range indices are ignored
    pub fn set(&mut self, idx: usize, value: bool) {
        if idx >= self.len {
            return;
        }
        if value {
            bit_util::set_bit(&mut self.bytes, idx);
        } else {
            bit_util::unset_bit(&mut self.bytes, idx);
        }
    }

    pub fn resize(&mut self, len: usize, value: bool) {
        let old_len = self.len;
        self.bytes.resize(bit_util::ceil(len, 8), 0);
        self.len = len;

        if len < old_len {
            for idx in len..self.bytes.len() * 8 {
                bit_util::unset_bit(&mut self.bytes, idx);
            }
        } else if value {
            for idx in old_len..len {
                bit_util::set_bit(&mut self.bytes, idx);
            }
        }
    }

    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |idx| self.get(idx))
    }
}
