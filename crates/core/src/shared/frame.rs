use ndarray::{Array3, ArrayView3, Axis};

/// Number of interleaved channels in every frame (B, G, R).
pub const CHANNELS: usize = 3;

/// A single captured image: contiguous BGR bytes in row-major order.
///
/// BGR is the channel order the face analyzer expects. Conversion from
/// decoder output happens once, at the capture boundary.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Builds a BGR frame from RGB bytes by reversing the channel axis.
    pub fn from_rgb(
        rgb: Vec<u8>,
        width: u32,
        height: u32,
        index: usize,
    ) -> Result<Self, ndarray::ShapeError> {
        let mut pixels = Array3::from_shape_vec((height as usize, width as usize, CHANNELS), rgb)?;
        pixels.invert_axis(Axis(2));
        let data = pixels.iter().copied().collect();
        Ok(Self::new(data, width, height, index))
    }

    /// Blank (black) frame, mostly useful as a stand-in when the pixels
    /// themselves don't matter to the analyzer.
    pub fn blank(width: u32, height: u32, index: usize) -> Self {
        Self::new(
            vec![0u8; width as usize * height as usize * CHANNELS],
            width,
            height,
            index,
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `(height, width, channel)` view in BGR order.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
