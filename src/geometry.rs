use thiserror::Error;

/// Smallest and largest supported board edge. The upper limit comes from the
/// chamber analyzer, which keeps one u32 bitmap word per row.
pub const MIN_BOARD_EDGE: u32 = 4;
pub const MAX_BOARD_EDGE: u32 = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DimensionsError {
    #[error("board width {0} outside supported range {MIN_BOARD_EDGE}..={MAX_BOARD_EDGE}")]
    InvalidWidth(u32),
    #[error("board height {0} outside supported range {MIN_BOARD_EDGE}..={MAX_BOARD_EDGE}")]
    InvalidHeight(u32),
}

/// Board geometry with positions packed as `x + y * stride`, where the stride
/// is the next power of two at or above the width. Extracting coordinates is
/// then a mask and a shift instead of a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub board_size: u32,
    /// Row stride of the packed representation.
    pub stride: u32,
    /// `stride - 1`, extracts the x coordinate.
    pub mask: u32,
    /// `log2(stride)`, extracts the y coordinate.
    pub shift: u32,
    /// `stride * height`; packed values in `0..array_size` may still be
    /// off-board when `width < stride`.
    pub array_size: u32,
    /// Upper bound on sliding destinations from any one square.
    pub max_trace: u32,
    offsets: [i32; 8],
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, DimensionsError> {
        if !(MIN_BOARD_EDGE..=MAX_BOARD_EDGE).contains(&width) {
            return Err(DimensionsError::InvalidWidth(width));
        }
        if !(MIN_BOARD_EDGE..=MAX_BOARD_EDGE).contains(&height) {
            return Err(DimensionsError::InvalidHeight(height));
        }

        let stride = width.next_power_of_two();
        let shift = stride.trailing_zeros();
        let stride_i = stride as i32;
        // The 8 queen/arrow ray directions as packed-position deltas.
        let offsets = [
            -stride_i - 1,
            -stride_i,
            -stride_i + 1,
            -1,
            1,
            stride_i - 1,
            stride_i,
            stride_i + 1,
        ];

        Ok(Dimensions {
            width,
            height,
            board_size: width * height,
            stride,
            mask: stride - 1,
            shift,
            array_size: stride * height,
            max_trace: width + height + 2 * width.min(height) - 4,
            offsets,
        })
    }

    #[inline]
    pub fn x(&self, position: u32) -> u32 {
        position & self.mask
    }

    #[inline]
    pub fn y(&self, position: u32) -> u32 {
        position >> self.shift
    }

    #[inline]
    pub fn position(&self, x: u32, y: u32) -> u32 {
        x + (y << self.shift)
    }

    /// Bounds check for a ray-walk candidate. Takes an i32 because walking a
    /// negative offset off the top of the board goes below zero.
    #[inline]
    pub fn out_of_bounds(&self, candidate: i32) -> bool {
        candidate < 0
            || candidate as u32 >= self.array_size
            || self.x(candidate as u32) >= self.width
    }

    #[inline]
    pub fn offsets(&self) -> &[i32; 8] {
        &self.offsets
    }
}
