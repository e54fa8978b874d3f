use std::ops::Range;

use crate::error::{Error, Result};

/// Index order of one quad whose vertices are laid out top-left, top-right, bottom-left,
/// bottom-right
const QUAD_PATTERN: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// The index a pure quad layout holds at `position`
#[inline]
fn basic_quad_index(position: usize) -> u32 {
    4 * (position / 6) as u32 + QUAD_PATTERN[position % 6]
}

fn shifted(index: u32, offset: u32) -> Result<u32> {
    index
        .checked_add(offset)
        .ok_or(Error::IndexOverflow { index, offset })
}

/// Index width used when uploading to the GPU
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl From<IndexFormat> for wgpu::IndexFormat {
    fn from(value: IndexFormat) -> Self {
        match value {
            IndexFormat::U16 => wgpu::IndexFormat::Uint16,
            IndexFormat::U32 => wgpu::IndexFormat::Uint32,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Indices {
    /// Every index follows the two-triangles-per-quad pattern; nothing is stored
    QuadLayout { len: usize },
    Explicit(Vec<u32>),
}

/// Triangle indices of a mesh
///
/// As long as every index follows the canonical quad pattern (`0,1,2, 1,3,2` repeated with a
/// stride of 4) the data is kept implicitly and costs nothing to store or copy. The first write
/// that breaks the pattern switches to an explicit list for good; only [`clear`](Self::clear)
/// brings the quad layout back.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexData {
    indices: Indices,
}

impl Default for IndexData {
    fn default() -> Self {
        Self {
            indices: Indices::QuadLayout { len: 0 },
        }
    }
}

impl IndexData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_indices(&self) -> usize {
        match &self.indices {
            Indices::QuadLayout { len } => *len,
            Indices::Explicit(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_indices() == 0
    }

    /// Grows or truncates to `n` indices
    ///
    /// New indices are zero, exactly as when [`set_index`](Self::set_index) writes past the end.
    /// Truncating keeps the quad layout; growing it leaves the layout unless the single new
    /// index is a zero at position 0.
    pub fn set_num_indices(&mut self, n: usize) {
        if let Indices::QuadLayout { len } = &mut self.indices {
            if n <= *len || n == 1 {
                *len = n;
                return;
            }
        }
        self.explicit_mut().resize(n, 0);
    }

    /// Number of complete triangles
    pub fn num_triangles(&self) -> usize {
        self.num_indices() / 3
    }

    /// Number of complete quads, or `None` once the quad layout has been left
    pub fn num_quads(&self) -> Option<usize> {
        match self.indices {
            Indices::QuadLayout { len } => Some(len / 6),
            Indices::Explicit(_) => None,
        }
    }

    pub fn use_quad_layout(&self) -> bool {
        matches!(self.indices, Indices::QuadLayout { .. })
    }

    /// Leaves the quad layout, storing every index explicitly
    pub fn force_explicit(&mut self) {
        self.explicit_mut();
    }

    /// Removes all indices & returns to the (empty) quad layout
    pub fn clear(&mut self) {
        self.indices = Indices::QuadLayout { len: 0 };
    }

    /// Releases spare capacity of an explicit index list
    pub fn trim(&mut self) {
        if let Indices::Explicit(indices) = &mut self.indices {
            indices.shrink_to_fit();
        }
    }

    /// Writes an index, growing the data (zero-filled) when `position` is past the end
    pub fn set_index(&mut self, position: usize, value: u32) {
        if let Indices::QuadLayout { len } = &mut self.indices {
            if value == basic_quad_index(position) {
                if position < *len {
                    return;
                }
                if position == *len {
                    *len += 1;
                    return;
                }
            }
        }

        let indices = self.explicit_mut();
        if position >= indices.len() {
            indices.resize(position + 1, 0);
        }
        indices[position] = value;
    }

    pub fn index(&self, position: usize) -> Result<u32> {
        let len = self.num_indices();
        if position >= len {
            return Err(Error::out_of_bounds("index", position, len));
        }
        Ok(self.index_unchecked(position))
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        let n = self.num_indices();
        self.set_index(n, a);
        self.set_index(n + 1, b);
        self.set_index(n + 2, c);
    }

    /// Appends a quad with vertices laid out as
    ///
    /// ```text
    /// a - b
    /// | / |
    /// c - d
    /// ```
    pub fn add_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.add_triangle(a, b, c);
        self.add_triangle(b, d, c);
    }

    /// Adds `offset` to `count` indices (all remaining if `None`) starting at `first`
    pub fn offset_indices(&mut self, offset: u32, first: usize, count: Option<usize>) -> Result<()> {
        let range = self.range(first, count)?;
        if offset == 0 || range.is_empty() {
            return Ok(());
        }
        // validate before touching anything, so a failed call leaves the data as it was
        for i in range.clone() {
            shifted(self.index_unchecked(i), offset)?;
        }
        for index in &mut self.explicit_mut()[range] {
            *index += offset;
        }
        Ok(())
    }

    /// Copies `count` indices (all remaining if `None`) starting at `index_id` into `target` at
    /// `target_index_id`, adding `offset` to each
    ///
    /// When both sides use the quad layout and the copied indices still follow the pattern at
    /// their destination, `target` keeps its quad layout.
    pub fn copy_to(
        &self,
        target: &mut IndexData,
        target_index_id: usize,
        offset: u32,
        index_id: usize,
        count: Option<usize>,
    ) -> Result<()> {
        let range = self.range(index_id, count)?;
        let n = range.len();
        if n == 0 {
            return Ok(());
        }

        if let (Indices::QuadLayout { .. }, Indices::QuadLayout { len: target_len }) =
            (&self.indices, &mut target.indices)
        {
            if target_index_id <= *target_len
                && Self::keeps_quad_layout(index_id, target_index_id, offset, n)
            {
                *target_len = (*target_len).max(target_index_id + n);
                return Ok(());
            }
        }

        let end = target_index_id
            .checked_add(n)
            .ok_or_else(|| Error::out_of_bounds("index", target_index_id, target.num_indices()))?;
        let shifted_indices = range
            .map(|i| shifted(self.index_unchecked(i), offset))
            .collect::<Result<Vec<_>>>()?;

        let dst = target.explicit_mut();
        if dst.len() < end {
            dst.resize(end, 0);
        }
        dst[target_index_id..end].copy_from_slice(&shifted_indices);
        Ok(())
    }

    fn keeps_quad_layout(index_id: usize, target_index_id: usize, offset: u32, n: usize) -> bool {
        let distance = target_index_id as i64 - index_id as i64;
        if distance >= 0
            && distance % 6 == 0
            && offset % 4 == 0
            && distance / 6 * 4 == offset as i64
        {
            // whole quads moved by exactly as many quads as the offset skips
            return true;
        }
        (0..n).all(|i| {
            basic_quad_index(index_id + i).checked_add(offset)
                == Some(basic_quad_index(target_index_id + i))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.num_indices()).map(|i| self.index_unchecked(i))
    }

    pub fn to_vec(&self) -> Vec<u32> {
        match &self.indices {
            Indices::QuadLayout { len } => (0..*len).map(basic_quad_index).collect(),
            Indices::Explicit(indices) => indices.clone(),
        }
    }

    /// Indices narrowed to 16 bits; only meaningful when [`required_format`](Self::required_format)
    /// is [`IndexFormat::U16`]
    pub fn to_u16_vec(&self) -> Vec<u16> {
        self.iter().map(|i| i as u16).collect()
    }

    pub fn max_index(&self) -> Option<u32> {
        match &self.indices {
            // the pattern only grows, so the maximum sits in the last quad
            Indices::QuadLayout { len } => {
                (len.saturating_sub(6)..*len).map(basic_quad_index).max()
            }
            Indices::Explicit(indices) => indices.iter().copied().max(),
        }
    }

    /// The narrowest format that can hold every index
    pub fn required_format(&self) -> IndexFormat {
        match self.max_index() {
            Some(max) if max > u16::MAX as u32 => IndexFormat::U32,
            _ => IndexFormat::U16,
        }
    }

    fn index_unchecked(&self, position: usize) -> u32 {
        match &self.indices {
            Indices::QuadLayout { .. } => basic_quad_index(position),
            Indices::Explicit(indices) => indices[position],
        }
    }

    fn explicit_mut(&mut self) -> &mut Vec<u32> {
        if let Indices::QuadLayout { len } = self.indices {
            log::trace!("index data leaves quad layout at {len} indices");
            self.indices = Indices::Explicit((0..len).map(basic_quad_index).collect());
        }
        match &mut self.indices {
            Indices::Explicit(indices) => indices,
            Indices::QuadLayout { .. } => unreachable!("converted above"),
        }
    }

    fn range(&self, start: usize, count: Option<usize>) -> Result<Range<usize>> {
        let len = self.num_indices();
        if start > len {
            return Err(Error::out_of_bounds("index", start, len));
        }
        let end = match count {
            Some(count) => start
                .checked_add(count)
                .filter(|&end| end <= len)
                .ok_or_else(|| Error::out_of_bounds("index", start.saturating_add(count) - 1, len))?,
            None => len,
        };
        Ok(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_pattern_triangles_keep_layout() {
        let mut data = IndexData::new();
        data.add_triangle(0, 1, 2);
        data.add_triangle(1, 3, 2);

        assert!(data.use_quad_layout());
        assert_eq!(data.num_quads(), Some(1));
        assert_eq!(data.num_triangles(), 2);
        assert_eq!(data.to_vec(), [0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn out_of_pattern_triangle_switches_layout() {
        let mut data = IndexData::new();
        data.add_triangle(1, 3, 2);

        assert!(!data.use_quad_layout());
        assert_eq!(data.num_quads(), None);
        assert_eq!(data.to_vec(), [1, 3, 2]);
    }

    #[test]
    fn downgrade_is_permanent_until_clear() {
        let mut data = IndexData::new();
        data.add_quad(0, 1, 2, 3);
        data.set_index(0, 5);
        data.set_index(0, 0);
        assert!(!data.use_quad_layout());
        assert_eq!(data.to_vec(), [0, 1, 2, 1, 3, 2]);

        data.clear();
        assert!(data.use_quad_layout());
        assert_eq!(data.num_indices(), 0);
    }

    #[test]
    fn set_index_past_end_zero_fills() {
        let mut data = IndexData::new();
        data.set_index(9, 1);

        assert_eq!(data.num_indices(), 10);
        for i in 6..=8 {
            assert_eq!(data.index(i).unwrap(), 0);
        }
        assert_eq!(data.index(9).unwrap(), 1);
        assert_eq!(data.to_vec(), [0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn growth_paths_agree() {
        let mut by_count = IndexData::new();
        by_count.add_quad(0, 1, 2, 3);
        by_count.set_num_indices(10);

        let mut by_write = IndexData::new();
        by_write.add_quad(0, 1, 2, 3);
        by_write.set_index(9, 0);

        assert_eq!(by_count, by_write);
        assert_eq!(by_count.to_vec(), [0, 1, 2, 1, 3, 2, 0, 0, 0, 0]);
        assert!(!by_count.use_quad_layout());

        let mut fresh = IndexData::new();
        fresh.set_num_indices(10);
        assert_eq!(fresh.to_vec(), [0; 10]);

        // shrinking stays compact
        let mut quads = IndexData::new();
        quads.add_quad(0, 1, 2, 3);
        quads.add_quad(4, 5, 6, 7);
        quads.set_num_indices(6);
        assert!(quads.use_quad_layout());
        assert_eq!(quads.to_vec(), [0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn read_past_end_fails() {
        let mut data = IndexData::new();
        data.add_quad(0, 1, 2, 3);
        assert_eq!(
            data.index(6),
            Err(Error::OutOfBounds {
                buffer: "index",
                index: 6,
                len: 6
            })
        );
    }

    #[test]
    fn add_quad_orders_triangles() {
        let mut data = IndexData::new();
        data.add_quad(4, 5, 6, 7);
        assert!(!data.use_quad_layout());
        assert_eq!(data.to_vec(), [4, 5, 6, 5, 7, 6]);

        let mut quads = IndexData::new();
        quads.add_quad(0, 1, 2, 3);
        quads.add_quad(4, 5, 6, 7);
        assert!(quads.use_quad_layout());
        assert_eq!(quads.num_quads(), Some(2));
    }

    #[test]
    fn offset_indices_range() {
        let mut data = IndexData::new();
        data.add_quad(0, 1, 2, 3);
        data.offset_indices(10, 3, Some(3)).unwrap();
        assert_eq!(data.to_vec(), [0, 1, 2, 11, 13, 12]);
        assert!(data.offset_indices(1, 4, Some(3)).is_err());
    }

    #[test]
    fn huge_ranges_and_offsets_are_rejected() {
        let mut data = IndexData::new();
        data.add_quad(0, 1, 2, 3);
        assert!(matches!(
            data.offset_indices(1, 2, Some(usize::MAX)),
            Err(Error::OutOfBounds { buffer: "index", .. })
        ));

        let mut target = IndexData::new();
        assert!(data.copy_to(&mut target, 0, 0, 1, Some(usize::MAX)).is_err());
        assert!(data.copy_to(&mut target, usize::MAX, 0, 0, None).is_err());
        assert!(target.is_empty());

        assert_eq!(
            data.offset_indices(u32::MAX, 0, None),
            Err(Error::IndexOverflow {
                index: 1,
                offset: u32::MAX
            })
        );
        // the failed offset left every index untouched
        assert!(data.use_quad_layout());
        assert_eq!(data.to_vec(), [0, 1, 2, 1, 3, 2]);

        let mut shifted = IndexData::new();
        assert!(data.copy_to(&mut shifted, 0, u32::MAX, 0, None).is_err());
    }

    #[test]
    fn copy_between_quad_layouts_stays_compact() {
        let mut source = IndexData::new();
        source.add_quad(0, 1, 2, 3);

        let mut batch = IndexData::new();
        source.copy_to(&mut batch, 0, 0, 0, None).unwrap();
        source.copy_to(&mut batch, 6, 4, 0, None).unwrap();

        assert!(batch.use_quad_layout());
        assert_eq!(batch.num_quads(), Some(2));
        assert_eq!(batch.to_vec(), [0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6]);
    }

    #[test]
    fn misaligned_copy_goes_explicit() {
        let mut source = IndexData::new();
        source.add_quad(0, 1, 2, 3);

        let mut batch = IndexData::new();
        source.copy_to(&mut batch, 0, 0, 0, None).unwrap();
        // second quad placed over the first quad's vertices
        source.copy_to(&mut batch, 6, 0, 0, None).unwrap();

        assert!(!batch.use_quad_layout());
        assert_eq!(batch.to_vec(), [0, 1, 2, 1, 3, 2, 0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn copy_with_gap_zero_fills() {
        let mut source = IndexData::new();
        source.add_triangle(0, 1, 2);

        let mut target = IndexData::new();
        source.copy_to(&mut target, 3, 2, 0, None).unwrap();
        assert_eq!(target.to_vec(), [0, 0, 0, 2, 3, 4]);
    }

    #[test]
    fn explicit_source_copies_with_offset() {
        let mut source = IndexData::new();
        source.add_triangle(2, 1, 0);

        let mut target = IndexData::new();
        target.add_quad(0, 1, 2, 3);
        source.copy_to(&mut target, 6, 4, 0, None).unwrap();
        assert_eq!(target.to_vec(), [0, 1, 2, 1, 3, 2, 6, 5, 4]);
    }

    #[test]
    fn formats_and_max_index() {
        let mut data = IndexData::new();
        assert_eq!(data.max_index(), None);
        data.add_quad(0, 1, 2, 3);
        data.add_quad(4, 5, 6, 7);
        assert_eq!(data.max_index(), Some(7));
        assert_eq!(data.required_format(), IndexFormat::U16);
        assert_eq!(data.to_u16_vec(), [0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6]);

        data.add_triangle(70_000, 0, 1);
        assert_eq!(data.required_format(), IndexFormat::U32);
    }

    #[test]
    fn clone_is_independent() {
        let mut original = IndexData::new();
        original.add_triangle(3, 2, 1);
        let mut copy = original.clone();
        copy.set_index(0, 9);
        assert_eq!(original.to_vec(), [3, 2, 1]);
        assert_eq!(copy.to_vec(), [9, 2, 1]);
    }
}
