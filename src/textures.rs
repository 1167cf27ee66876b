//! CPU-side image data for the renderers.
//!
//! - [`TextureData`]: an RGBA8 image plus sampling settings, loaded from disk
//!   or generated (the rain atlas placeholder, solid colors).
//! - [`CubemapFaces`]: six square faces cut out of a horizontal-cross skybox
//!   atlas.
//!
//! Rows are stored top to bottom, which is what wgpu expects.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};

use crate::error::TextureError;

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default).
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering.
    Nearest,
}

/// Address mode for texture wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Clamp to edge color (default). Atlas cells must not bleed.
    #[default]
    ClampToEdge,
    /// Repeat/tile the texture. Used for scene materials.
    Repeat,
}

/// An RGBA8 image ready for upload.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filter: FilterMode,
    pub address_mode: AddressMode,
}

impl TextureData {
    /// Wrap raw RGBA data, checking its length.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            filter: FilterMode::Linear,
            address_mode: AddressMode::ClampToEdge,
        })
    }

    /// Load an image file and convert it to RGBA8.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.into_rgba8();
        Ok(Self::from_image(img))
    }

    /// Take ownership of a decoded image.
    pub fn from_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            filter: FilterMode::Linear,
            address_mode: AddressMode::ClampToEdge,
        }
    }

    /// Set the address mode for UV wrapping.
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode = mode;
        self
    }

    /// Create a solid color texture (1x1 pixel).
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
            filter: FilterMode::Nearest,
            address_mode: AddressMode::Repeat,
        }
    }

    /// Generate a stand-in rain atlas.
    ///
    /// `rows` × `cols` cells of `cell` pixels. Rows 0 and 1 hold the two
    /// falling frames (a thin streak, the second slightly longer), row 2 a
    /// flattened drop on the ground, row 3 a splash ring. Columns vary the
    /// streak width and brightness. Extra rows stay transparent.
    pub fn rain_atlas(rows: u32, cols: u32, cell: u32) -> Self {
        let cell = cell.max(4);
        let (width, height) = (cols * cell, rows * cell);
        let mut img = RgbaImage::new(width, height);

        for row in 0..rows.min(4) {
            for col in 0..cols {
                let shade = 200 + (col * 55 / cols.max(1)) as u8;
                for y in 0..cell {
                    for x in 0..cell {
                        // Cell-local coordinates in [-1, 1], y down.
                        let u = (x as f32 + 0.5) / cell as f32 * 2.0 - 1.0;
                        let v = (y as f32 + 0.5) / cell as f32 * 2.0 - 1.0;
                        let alpha = drop_alpha(row, col, u, v);
                        if alpha > 0.0 {
                            let a = (alpha.min(1.0) * 255.0) as u8;
                            img.put_pixel(
                                col * cell + x,
                                row * cell + y,
                                Rgba([shade - 40, shade - 20, shade, a]),
                            );
                        }
                    }
                }
            }
        }

        Self::from_image(img)
    }
}

/// Coverage of one procedural atlas cell at (u, v).
fn drop_alpha(row: u32, col: u32, u: f32, v: f32) -> f32 {
    let half_width = 0.06 + 0.03 * col as f32;
    match row {
        0 | 1 => {
            let half_length = if row == 0 { 0.6 } else { 0.75 };
            if v.abs() > half_length {
                return 0.0;
            }
            let taper = 1.0 - (v + half_length) / (2.0 * half_length) * 0.5;
            (1.0 - u.abs() / (half_width * taper)).max(0.0) * 0.9
        }
        2 => {
            // Flattened blob resting on the bottom of the cell.
            let dx = u / 0.45;
            let dy = (v - 0.7) / 0.2;
            (1.0 - (dx * dx + dy * dy)).max(0.0) * 1.5
        }
        3 => {
            let dx = u / 0.8;
            let dy = (v - 0.6) / 0.3;
            let r = (dx * dx + dy * dy).sqrt();
            (1.0 - (r - 0.8).abs() / 0.15).max(0.0)
        }
        _ => 0.0,
    }
}

/// Cubemap face order used by wgpu texture layers.
pub const CUBE_FACES: [&str; 6] = ["+X", "-X", "+Y", "-Y", "+Z", "-Z"];

/// Color used for faces that do not fit inside the atlas.
pub const PLACEHOLDER_FACE: [u8; 4] = [128, 128, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    None,
    /// Quarter turn counter-clockwise.
    Ccw90,
    Half,
    /// Three quarter turns counter-clockwise.
    Ccw270,
}

/// Atlas cell (column, row) and orientation fix for each layer, in
/// [`CUBE_FACES`] order. The cross center faces +Y, its top +Z (Z is up).
const CROSS_LAYOUT: [((u32, u32), Turn); 6] = [
    ((2, 1), Turn::Ccw90),
    ((0, 1), Turn::Ccw270),
    ((1, 1), Turn::None),
    ((3, 1), Turn::Half),
    ((1, 0), Turn::None),
    ((1, 2), Turn::Half),
];

/// Six square RGBA8 faces in wgpu layer order (+X, -X, +Y, -Y, +Z, -Z).
#[derive(Debug, Clone)]
pub struct CubemapFaces {
    /// Edge length of every face in pixels.
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

impl CubemapFaces {
    /// Load a horizontal-cross skybox atlas from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.into_rgba8();
        Self::from_cross_atlas(&img)
    }

    /// Cut the six faces out of a 4×3 cross atlas.
    ///
    /// The face size is a third of the atlas height. Cells that fall outside
    /// the atlas become a solid [`PLACEHOLDER_FACE`].
    pub fn from_cross_atlas(atlas: &RgbaImage) -> Result<Self, TextureError> {
        let (width, height) = atlas.dimensions();
        let size = height / 3;
        if size == 0 {
            return Err(TextureError::AtlasTooSmall { width, height });
        }

        let faces = CROSS_LAYOUT.map(|((col, row), turn)| {
            let (x, y) = (col * size, row * size);
            if x + size > width || y + size > height {
                log::warn!(
                    "skybox atlas {width}x{height} has no cell at ({col}, {row}), using placeholder"
                );
                return RgbaImage::from_pixel(size, size, Rgba(PLACEHOLDER_FACE)).into_raw();
            }

            let face = imageops::crop_imm(atlas, x, y, size, size).to_image();
            let face = match turn {
                Turn::None => face,
                Turn::Ccw90 => imageops::rotate270(&face),
                Turn::Half => imageops::rotate180(&face),
                Turn::Ccw270 => imageops::rotate90(&face),
            };
            imageops::flip_vertical(&face).into_raw()
        });

        Ok(Self { size, faces })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x3 cross atlas of `size`-pixel cells, each cell filled with a color
    /// that encodes its (col, row).
    fn cross_atlas(size: u32, cols: u32) -> RgbaImage {
        RgbaImage::from_fn(cols * size, 3 * size, |x, y| {
            Rgba([(x / size) as u8 * 10, (y / size) as u8 * 10, 0, 255])
        })
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(TextureData::from_rgba(vec![0; 16], 2, 2).is_ok());
        assert!(matches!(
            TextureData::from_rgba(vec![0; 15], 2, 2),
            Err(TextureError::SizeMismatch { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_rain_atlas_dimensions_and_coverage() {
        let atlas = TextureData::rain_atlas(4, 4, 32);
        assert_eq!((atlas.width, atlas.height), (128, 128));
        assert_eq!(atlas.data.len(), 128 * 128 * 4);

        // Every state row has visible pixels in every column.
        for row in 0..4u32 {
            for col in 0..4u32 {
                let visible = (0..32).any(|y| {
                    (0..32).any(|x| {
                        let px = ((row * 32 + y) * 128 + col * 32 + x) as usize * 4;
                        atlas.data[px + 3] >= 26
                    })
                });
                assert!(visible, "cell ({row}, {col}) is empty");
            }
        }
    }

    #[test]
    fn test_cross_atlas_face_selection() {
        let atlas = cross_atlas(8, 4);
        let cube = CubemapFaces::from_cross_atlas(&atlas).unwrap();
        assert_eq!(cube.size, 8);

        // Uniform cells survive rotation and flipping unchanged, so the
        // first pixel identifies the source cell.
        let expected = [(2, 1), (0, 1), (1, 1), (3, 1), (1, 0), (1, 2)];
        for (face, (col, row)) in cube.faces.iter().zip(expected) {
            assert_eq!(face.len(), 8 * 8 * 4);
            assert_eq!(&face[..4], &[col * 10, row * 10, 0, 255]);
        }
    }

    #[test]
    fn test_missing_cells_use_placeholder() {
        // Only three columns: the -Y cell at column 3 is missing.
        let atlas = cross_atlas(4, 3);
        let cube = CubemapFaces::from_cross_atlas(&atlas).unwrap();
        assert!(cube.faces[3].chunks(4).all(|px| px == PLACEHOLDER_FACE));
        assert_eq!(&cube.faces[2][..4], &[10, 10, 0, 255]);
    }

    #[test]
    fn test_face_orientation() {
        // A single marked pixel in the top-left corner of the +X cell.
        let size = 4;
        let mut atlas = RgbaImage::new(4 * size, 3 * size);
        atlas.put_pixel(2 * size, size, Rgba([255, 0, 0, 255]));

        let cube = CubemapFaces::from_cross_atlas(&atlas).unwrap();
        let marked: Vec<usize> = cube.faces[0]
            .chunks(4)
            .enumerate()
            .filter(|(_, px)| px[0] == 255)
            .map(|(i, _)| i)
            .collect();

        // Counter-clockwise quarter turn moves top-left to bottom-left, the
        // vertical flip then moves it to top-left again.
        assert_eq!(marked, vec![0]);
    }

    #[test]
    fn test_tiny_atlas_is_rejected() {
        let atlas = RgbaImage::new(4, 2);
        assert!(matches!(
            CubemapFaces::from_cross_atlas(&atlas),
            Err(TextureError::AtlasTooSmall { .. })
        ));
    }
}
