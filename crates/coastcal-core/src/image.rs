use crate::PixelBoundingBox;

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major luma buffer; `None` when the length does not match.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        let expected = width.checked_mul(height)?;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Full-frame box `(0, 0, width, height)`.
    pub fn bounds(&self) -> PixelBoundingBox {
        PixelBoundingBox::new(0, 0, self.width as i32, self.height as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_wrong_buffer_length() {
        let data = vec![0u8; 11];
        assert!(GrayImageView::new(4, 3, &data).is_none());
        assert!(GrayImageView::new(usize::MAX, 2, &data).is_none());
        let data = vec![7u8; 12];
        let view = GrayImageView::new(4, 3, &data).expect("view");
        assert_eq!(view.get(3, 2), Some(7));
        assert_eq!(view.get(4, 0), None);
        assert_eq!(view.row(1).len(), 4);
        assert_eq!(view.bounds(), PixelBoundingBox::new(0, 0, 4, 3));
    }
}
