//! ZPL label encoder
//!
//! Turns a label setup plus one image placement into a complete ZPL II
//! document. The output is a pure function of the inputs: the same
//! [`LabelSpec`] and [`ImagePlacement`] always produce the same bytes, and the
//! setup preamble is emitted in a fixed order because the printer interprets
//! the stream line by line.
//!
//! ```text
//! ^XA
//! ^PW609
//! ^LL609
//! ^LH0,0
//! ^FWN
//! ^MNM,24
//! ^FO50,50^GFA,10,10,10,:B64:AAECAwQFBgcICQ==:AB38^FS
//! ^XZ
//! ```

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{PrintError, PrintResult};

/// Largest coordinate ZPL accepts for `^FO` / `^LH`
pub const MAX_COORDINATE: u32 = 32000;

/// Largest black-mark offset accepted by `^MN`
pub const MAX_MARK_OFFSET: u32 = 283;

/// Default field orientation (`^FW`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    #[default]
    Normal,
    /// 90 degrees clockwise
    Rotated,
    /// 180 degrees
    Inverted,
    /// 270 degrees, read from bottom up
    BottomUp,
}

impl Orientation {
    fn code(self) -> char {
        match self {
            Orientation::Normal => 'N',
            Orientation::Rotated => 'R',
            Orientation::Inverted => 'I',
            Orientation::BottomUp => 'B',
        }
    }
}

impl FromStr for Orientation {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" | "N" => Ok(Orientation::Normal),
            "ROTATED" | "R" => Ok(Orientation::Rotated),
            "INVERTED" | "I" => Ok(Orientation::Inverted),
            "BOTTOM_UP" | "B" => Ok(Orientation::BottomUp),
            other => Err(PrintError::InvalidConfig(format!(
                "Unknown orientation: {}",
                other
            ))),
        }
    }
}

/// Media tracking mode (`^MN`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    /// Black mark sensing, `media_dots` is the mark offset
    #[default]
    MarkSensing,
    /// Continuous media, no inter-label sensing
    Continuous,
    /// Gap / notch (web) sensing
    Gap,
}

impl FromStr for MediaType {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARK_SENSING" | "MARK" => Ok(MediaType::MarkSensing),
            "CONTINUOUS" => Ok(MediaType::Continuous),
            "GAP" | "WEB" => Ok(MediaType::Gap),
            other => Err(PrintError::InvalidConfig(format!(
                "Unknown media type: {}",
                other
            ))),
        }
    }
}

/// Label geometry and media setup
///
/// Supplied by configuration and never mutated by a print job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSpec {
    pub width_dots: u32,
    pub height_dots: u32,
    pub home_x: u32,
    pub home_y: u32,
    pub orientation: Orientation,
    pub media_type: MediaType,
    pub media_dots: u32,
}

impl Default for LabelSpec {
    /// 3 inch square label at 203 dpi on black-mark media
    fn default() -> Self {
        Self {
            width_dots: 609,
            height_dots: 609,
            home_x: 0,
            home_y: 0,
            orientation: Orientation::Normal,
            media_type: MediaType::MarkSensing,
            media_dots: 24,
        }
    }
}

/// Image data placed on the label at `(x, y)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlacement {
    pub x: u32,
    pub y: u32,
    pub image_bytes: Vec<u8>,
    /// Row width of a packed 1-bit raster. `None` embeds the bytes as-is.
    pub bytes_per_row: Option<u32>,
}

impl ImagePlacement {
    /// Place opaque image bytes
    pub fn new(x: u32, y: u32, image_bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            x,
            y,
            image_bytes: image_bytes.into(),
            bytes_per_row: None,
        }
    }

    /// Place a packed monochrome raster with a known row width
    pub fn raster(x: u32, y: u32, data: Vec<u8>, bytes_per_row: u32) -> Self {
        Self {
            x,
            y,
            image_bytes: data,
            bytes_per_row: Some(bytes_per_row),
        }
    }
}

/// A finished ZPL document, ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDocument(String);

impl LabelDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }
}

impl fmt::Display for LabelDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode one label
///
/// Fails with [`PrintError::EncodingFailed`] for empty image data, zero
/// width/height, out-of-range coordinates or an inconsistent raster row
/// width.
#[instrument(skip(placement), fields(x = placement.x, y = placement.y, image_len = placement.image_bytes.len()))]
pub fn encode(spec: &LabelSpec, placement: &ImagePlacement) -> PrintResult<LabelDocument> {
    validate_spec(spec)?;

    let total = placement.image_bytes.len();
    if total == 0 {
        return Err(PrintError::EncodingFailed("Image data is empty".to_string()));
    }
    if placement.x > MAX_COORDINATE || placement.y > MAX_COORDINATE {
        return Err(PrintError::EncodingFailed(format!(
            "Placement ({}, {}) out of range",
            placement.x, placement.y
        )));
    }

    let bytes_per_row = match placement.bytes_per_row {
        Some(0) => {
            return Err(PrintError::EncodingFailed(
                "Raster row width is zero".to_string(),
            ));
        }
        Some(row) if total % row as usize != 0 => {
            return Err(PrintError::EncodingFailed(format!(
                "Raster of {} bytes is not a whole number of {}-byte rows",
                total, row
            )));
        }
        Some(row) => row as usize,
        None => (spec.width_dots.div_ceil(8) as usize).min(total),
    };

    let mut buf = String::with_capacity(128 + total * 4 / 3);
    zpl_line(&mut buf, "^XA");
    setup_preamble(&mut buf, spec);
    zpl_line(
        &mut buf,
        &format!(
            "^FO{},{}{}^FS",
            placement.x,
            placement.y,
            graphic_field(&placement.image_bytes, bytes_per_row)
        ),
    );
    zpl_line(&mut buf, "^XZ");

    Ok(LabelDocument(buf))
}

fn validate_spec(spec: &LabelSpec) -> PrintResult<()> {
    if spec.width_dots == 0 || spec.height_dots == 0 {
        return Err(PrintError::EncodingFailed(format!(
            "Label size must be positive, got {}x{}",
            spec.width_dots, spec.height_dots
        )));
    }
    if spec.width_dots > MAX_COORDINATE || spec.height_dots > MAX_COORDINATE {
        return Err(PrintError::EncodingFailed(format!(
            "Label size {}x{} out of range",
            spec.width_dots, spec.height_dots
        )));
    }
    if spec.home_x > MAX_COORDINATE || spec.home_y > MAX_COORDINATE {
        return Err(PrintError::EncodingFailed(format!(
            "Label home ({}, {}) out of range",
            spec.home_x, spec.home_y
        )));
    }
    if spec.media_type == MediaType::MarkSensing && spec.media_dots > MAX_MARK_OFFSET {
        return Err(PrintError::EncodingFailed(format!(
            "Mark offset {} exceeds {}",
            spec.media_dots, MAX_MARK_OFFSET
        )));
    }
    Ok(())
}

fn setup_preamble(buf: &mut String, spec: &LabelSpec) {
    zpl_line(buf, &format!("^PW{}", spec.width_dots));
    zpl_line(buf, &format!("^LL{}", spec.height_dots));
    zpl_line(buf, &format!("^LH{},{}", spec.home_x, spec.home_y));
    zpl_line(buf, &format!("^FW{}", spec.orientation.code()));
    let media = match spec.media_type {
        MediaType::MarkSensing => format!("^MNM,{}", spec.media_dots),
        MediaType::Continuous => "^MNN".to_string(),
        MediaType::Gap => "^MNY".to_string(),
    };
    zpl_line(buf, &media);
}

/// `^GFA` with base64 payload and CRC, e.g. `^GFA,10,10,10,:B64:...:AB38`
fn graphic_field(data: &[u8], bytes_per_row: usize) -> String {
    let encoded = STANDARD.encode(data);
    let crc = crc16_xmodem(encoded.as_bytes());
    format!(
        "^GFA,{total},{total},{bytes_per_row},:B64:{encoded}:{crc:04X}",
        total = data.len()
    )
}

fn zpl_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}

/// CRC-16/XMODEM (poly 0x1021, init 0), as used by ZPL `:B64:` fields
pub(crate) fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &b in data {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}
