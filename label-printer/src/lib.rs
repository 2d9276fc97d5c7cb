//! # label-printer
//!
//! ZPL label printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ZPL document encoding (label setup + graphic field)
//! - Image rasterization to 1-bit bitmaps (optional)
//! - Network printing (TCP port 9100)
//!
//! Deciding WHAT and WHEN to print stays in application code (print-bridge).
//!
//! ## Example
//!
//! ```ignore
//! use label_printer::{ImagePlacement, LabelSpec, NetworkPrinter, Printer, PrinterEndpoint};
//!
//! let doc = label_printer::encode(&LabelSpec::default(), &ImagePlacement::new(50, 50, png))?;
//!
//! let printer = NetworkPrinter::new(PrinterEndpoint::new("192.168.1.100", 9100)?);
//! let ack = printer.send(&doc).await?;
//! ```

mod error;
mod printer;
#[cfg(feature = "image")]
mod raster;
mod zpl;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use printer::{
    DEFAULT_PORT, NetworkPrinter, Printer, PrinterAck, PrinterEndpoint, TransportState, send,
};
pub use zpl::{
    ImagePlacement, LabelDocument, LabelSpec, MAX_COORDINATE, MediaType, Orientation, encode,
};

#[cfg(feature = "image")]
pub use raster::{Raster, rasterize};
