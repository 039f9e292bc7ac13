//! Image buffer types.
//!
//! - [`Image`] - Reference-counted, row-major RGBA8 buffer with a colour space tag
//! - [`ImageView`] - Immutable borrowed window onto a region
//! - [`ImageViewMut`] - Mutable borrowed window onto a region
//!
//! # Memory Layout
//!
//! Pixels are stored contiguously, top-to-bottom, with no row padding: the
//! buffer length is always exactly `width * height`.
//!
//! ```text
//! [P(0,0) P(1,0) ... P(w-1,0)]  <- row 0
//! [P(0,1) P(1,1) ... P(w-1,1)]  <- row 1
//! ```
//!
//! # Ownership
//!
//! Cloning an [`Image`] shares its storage. The first mutable access on a
//! shared buffer detaches it (copy-on-write), so a handle never observes
//! writes made through another handle. Storage is freed when the last handle
//! is dropped.
//!
//! # Views
//!
//! ```rust
//! use pfx_core::{Image, Rect};
//!
//! let img = Image::filled(8, 8, [10, 20, 30, 255]);
//! let view = img.view(Rect::new(2, 2, 4, 4)).unwrap();
//! assert_eq!(view.pixel(0, 0), [10, 20, 30, 255]);
//! assert!(img.view(Rect::new(6, 6, 4, 4)).is_err());
//! ```

use crate::{ColorSpace, Error, Pixel, Rect, Result};
use std::sync::Arc;

/// Owned, reference-counted image buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    data: Arc<Vec<Pixel>>,
    width: u32,
    height: u32,
    colorspace: ColorSpace,
}

impl Image {
    /// Creates a zero-filled RGB image.
    ///
    /// # Panics
    ///
    /// Aborts on allocation failure like any `Vec` allocation.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0; 4])
    }

    /// Creates an RGB image where every pixel is `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        Self {
            data: Arc::new(vec![pixel; width as usize * height as usize]),
            width,
            height,
            colorspace: ColorSpace::Rgb,
        }
    }

    /// Adopts decoded pixel data without copying it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len() != width * height`.
    pub fn from_data(width: u32, height: u32, data: Vec<Pixel>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} pixels, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            colorspace: ColorSpace::Rgb,
        })
    }

    /// Copies an interleaved RGBA byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `bytes.len() != width * height * 4`.
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} bytes, got {}", expected, bytes.len()),
            ));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Self::from_data(width, height, data)
    }

    /// Sets the colour space tag, builder style.
    #[must_use]
    pub fn with_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.colorspace = colorspace;
        self
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rectangle covering the whole image.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Current colour space tag.
    #[inline]
    pub fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    /// Retags the buffer. Pixel bytes are not touched.
    #[inline]
    pub fn set_colorspace(&mut self, colorspace: ColorSpace) {
        self.colorspace = colorspace;
    }

    /// Number of handles sharing this buffer.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// All pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.data
    }

    /// All pixels, mutable. Detaches shared storage first.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Pixel data as raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.pixels())
    }

    /// Pixel data as mutable raw bytes.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(self.pixels_mut())
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Returns the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.data[self.offset(x, y)]
    }

    /// Bounds-checked pixel read.
    pub fn try_pixel(&self, x: u32, y: u32) -> Result<Pixel> {
        if x < self.width && y < self.height {
            Ok(self.data[self.offset(x, y)])
        } else {
            Err(Error::out_of_bounds(x, y, self.width, self.height))
        }
    }

    /// Unchecked pixel read.
    ///
    /// # Safety
    ///
    /// `x < width` and `y < height` must hold.
    #[inline]
    pub unsafe fn pixel_unchecked(&self, x: u32, y: u32) -> Pixel {
        // SAFETY: caller guarantees the coordinates are in range.
        unsafe { *self.data.get_unchecked(self.offset(x, y)) }
    }

    /// Writes the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let offset = self.offset(x, y);
        self.pixels_mut()[offset] = pixel;
    }

    /// Bounds-checked pixel write.
    pub fn try_set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        if x < self.width && y < self.height {
            let offset = self.offset(x, y);
            self.pixels_mut()[offset] = pixel;
            Ok(())
        } else {
            Err(Error::out_of_bounds(x, y, self.width, self.height))
        }
    }

    /// Row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[Pixel] {
        assert!(y < self.height, "row {y} out of bounds");
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    /// Bounds-checked row access.
    pub fn try_row(&self, y: u32) -> Result<&[Pixel]> {
        if y < self.height {
            Ok(self.row(y))
        } else {
            Err(Error::RowOutOfBounds {
                y,
                height: self.height,
            })
        }
    }

    /// Mutable row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [Pixel] {
        assert!(y < self.height, "row {y} out of bounds");
        let start = y as usize * self.width as usize;
        let width = self.width as usize;
        &mut self.pixels_mut()[start..start + width]
    }

    /// Fills every pixel with `pixel`.
    pub fn fill(&mut self, pixel: Pixel) {
        self.pixels_mut().fill(pixel);
    }

    /// Makes this image a copy of `src`: pixels, geometry and tag.
    ///
    /// Reuses this buffer's allocation when it is not shared.
    pub fn copy_from(&mut self, src: &Image) {
        let data = Arc::make_mut(&mut self.data);
        data.clear();
        data.extend_from_slice(src.pixels());
        self.width = src.width;
        self.height = src.height;
        self.colorspace = src.colorspace;
    }

    /// Replaces geometry and pixels, keeping the colour space tag.
    ///
    /// Used by transforms that produce a differently sized buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len() != width * height`.
    pub fn replace_data(&mut self, width: u32, height: u32, data: Vec<Pixel>) -> Result<()> {
        let colorspace = self.colorspace;
        *self = Self::from_data(width, height, data)?.with_colorspace(colorspace);
        Ok(())
    }

    /// Immutable view of `region`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if `region` exceeds the image.
    pub fn view(&self, region: Rect) -> Result<ImageView<'_>> {
        self.check_region(region)?;
        Ok(ImageView {
            data: &self.data,
            stride: self.width as usize,
            region,
        })
    }

    /// Mutable view of `region`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if `region` exceeds the image.
    pub fn view_mut(&mut self, region: Rect) -> Result<ImageViewMut<'_>> {
        self.check_region(region)?;
        let stride = self.width as usize;
        Ok(ImageViewMut {
            data: self.pixels_mut(),
            stride,
            region,
        })
    }

    /// View of the whole image.
    pub fn as_view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            stride: self.width as usize,
            region: self.bounds(),
        }
    }

    fn check_region(&self, region: Rect) -> Result<()> {
        if region.fits_within(self.width, self.height) {
            Ok(())
        } else {
            Err(Error::invalid_region(
                region.x,
                region.y,
                region.width,
                region.height,
                self.width,
                self.height,
            ))
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("colorspace", &self.colorspace)
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// Immutable view into a region of pixel memory.
///
/// Never owns memory. Coordinates passed to its accessors are relative to the
/// view origin.
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [Pixel],
    stride: usize,
    region: Rect,
}

impl<'a> ImageView<'a> {
    /// Wraps externally owned, tightly packed pixel memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len() != width * height`.
    pub fn from_slice(data: &'a [Pixel], width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} pixels, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data,
            stride: width as usize,
            region: Rect::from_size(width, height),
        })
    }

    /// View width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.region.width
    }

    /// View height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.region.height
    }

    /// Region of the parent this view covers.
    #[inline]
    pub fn region(&self) -> Rect {
        self.region
    }

    /// Pixel at (x, y) relative to the view origin.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the view.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        assert!(x < self.region.width && y < self.region.height, "view pixel out of bounds");
        self.row(y)[x as usize]
    }

    /// Bounds-checked pixel read.
    pub fn try_pixel(&self, x: u32, y: u32) -> Result<Pixel> {
        if x < self.region.width && y < self.region.height {
            Ok(self.row(y)[x as usize])
        } else {
            Err(Error::out_of_bounds(x, y, self.region.width, self.region.height))
        }
    }

    /// Row `y` of the view.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [Pixel] {
        assert!(y < self.region.height, "view row out of bounds");
        let start = (self.region.y + y) as usize * self.stride + self.region.x as usize;
        &self.data[start..start + self.region.width as usize]
    }

    /// Bounds-checked row access.
    pub fn try_row(&self, y: u32) -> Result<&'a [Pixel]> {
        if y < self.region.height {
            Ok(self.row(y))
        } else {
            Err(Error::RowOutOfBounds {
                y,
                height: self.region.height,
            })
        }
    }

    /// Nested view, `region` relative to this view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if `region` exceeds this view.
    pub fn subview(&self, region: Rect) -> Result<ImageView<'a>> {
        if !region.fits_within(self.region.width, self.region.height) {
            return Err(Error::invalid_region(
                region.x,
                region.y,
                region.width,
                region.height,
                self.region.width,
                self.region.height,
            ));
        }
        Ok(ImageView {
            data: self.data,
            stride: self.stride,
            region: Rect::new(
                self.region.x + region.x,
                self.region.y + region.y,
                region.width,
                region.height,
            ),
        })
    }

    /// Copies the view into a new RGB-tagged image.
    pub fn to_image(&self) -> Image {
        let mut data = Vec::with_capacity(self.region.area());
        for y in 0..self.region.height {
            data.extend_from_slice(self.row(y));
        }
        Image {
            data: Arc::new(data),
            width: self.region.width,
            height: self.region.height,
            colorspace: ColorSpace::Rgb,
        }
    }
}

impl std::fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageView")
            .field("region", &self.region)
            .field("stride", &self.stride)
            .finish()
    }
}

/// Mutable view into a region of an image.
pub struct ImageViewMut<'a> {
    data: &'a mut [Pixel],
    stride: usize,
    region: Rect,
}

impl ImageViewMut<'_> {
    /// View width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.region.width
    }

    /// View height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.region.height
    }

    /// Region of the parent this view covers.
    #[inline]
    pub fn region(&self) -> Rect {
        self.region
    }

    #[inline]
    fn row_start(&self, y: u32) -> usize {
        (self.region.y + y) as usize * self.stride + self.region.x as usize
    }

    /// Pixel at (x, y) relative to the view origin.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the view.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        assert!(x < self.region.width && y < self.region.height, "view pixel out of bounds");
        self.data[self.row_start(y) + x as usize]
    }

    /// Writes the pixel at (x, y) relative to the view origin.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the view.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        assert!(x < self.region.width && y < self.region.height, "view pixel out of bounds");
        let idx = self.row_start(y) + x as usize;
        self.data[idx] = pixel;
    }

    /// Mutable row `y` of the view.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [Pixel] {
        assert!(y < self.region.height, "view row out of bounds");
        let start = self.row_start(y);
        &mut self.data[start..start + self.region.width as usize]
    }

    /// Fills the view with `pixel`.
    pub fn fill(&mut self, pixel: Pixel) {
        for y in 0..self.region.height {
            self.row_mut(y).fill(pixel);
        }
    }

    /// Copies an equally sized view into this one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the sizes differ.
    pub fn copy_from(&mut self, src: &ImageView<'_>) -> Result<()> {
        if src.width() != self.width() || src.height() != self.height() {
            return Err(Error::dimension_mismatch(
                (self.width(), self.height()),
                (src.width(), src.height()),
            ));
        }
        for y in 0..self.region.height {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ImageViewMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageViewMut")
            .field("region", &self.region)
            .field("stride", &self.stride)
            .finish()
    }
}
