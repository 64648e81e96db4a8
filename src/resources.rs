//! Background image resources: decoding, cover fitting and the asynchronous loader.
//!
//! Decoding happens off the UI thread when a tokio runtime is available. Results travel back
//! over an `mpsc` channel that the editor polls once per frame; each request carries a ticket
//! so only the most recent request can ever be applied.

use crate::error::ResourceError;
use crate::mapper::Bounds;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// A decoded raster in straight (non-premultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Decodes an encoded image held in memory.
    ///
    /// # Arguments
    ///
    /// * `url` - Source name, only used for error reporting
    /// * `bytes` - Encoded image bytes (PNG or JPEG)
    pub fn from_bytes(url: &str, bytes: &[u8]) -> Result<Self, ResourceError> {
        let decoded = image::load_from_memory(bytes).map_err(|source| ResourceError::Decode {
            url: url.to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    /// Reads and decodes an image file.
    pub fn load(path: &str) -> Result<Self, ResourceError> {
        let bytes = std::fs::read(path).map_err(|source| ResourceError::Io {
            url: path.to_string(),
            source,
        })?;
        Self::from_bytes(path, &bytes)
    }

    /// Natural size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Converts to a premultiplied tiny-skia pixmap.
    pub fn to_pixmap(&self) -> Option<tiny_skia::Pixmap> {
        let mut pixmap = tiny_skia::Pixmap::new(self.width, self.height)?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(self.rgba.chunks_exact(4)) {
            *dst = tiny_skia::ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Some(pixmap)
    }
}

/// Source region of an image that covers `canvas` when scaled uniformly.
///
/// The image is scaled to fill the canvas completely and the overflow is cropped evenly from
/// both sides, so the returned region has the canvas aspect ratio.
pub fn cover_crop(image: (u32, u32), canvas: (u32, u32)) -> Bounds {
    let (iw, ih) = (f64::from(image.0.max(1)), f64::from(image.1.max(1)));
    let (cw, ch) = (f64::from(canvas.0.max(1)), f64::from(canvas.1.max(1)));
    let (crop_w, crop_h) = if iw * ch > ih * cw {
        (ih * cw / ch, ih)
    } else {
        (iw, iw * ch / cw)
    };
    let x = (iw - crop_w) / 2.0;
    let y = (ih - crop_h) / 2.0;
    Bounds {
        min_x: x,
        min_y: y,
        max_x: x + crop_w,
        max_y: y + crop_h,
    }
}

/// Outcome of one decode request.
#[derive(Debug)]
pub struct DecodeResult {
    /// Ticket handed out by [`BackgroundLoader::request`]
    pub ticket: u64,
    /// Source the request was made for
    pub url: String,
    /// Decoded image or the reason it failed
    pub outcome: Result<Arc<DecodedImage>, ResourceError>,
}

/// Asynchronous background-image decoder.
pub struct BackgroundLoader {
    sender: Sender<DecodeResult>,
    receiver: Option<Receiver<DecodeResult>>,
    runtime: Option<tokio::runtime::Handle>,
    next_ticket: u64,
    latest: Option<u64>,
}

impl std::fmt::Debug for BackgroundLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundLoader")
            .field("attached", &self.receiver.is_some())
            .field("latest", &self.latest)
            .finish()
    }
}

impl Default for BackgroundLoader {
    fn default() -> Self {
        Self::new(tokio::runtime::Handle::try_current().ok())
    }
}

impl BackgroundLoader {
    /// Creates an attached loader.
    ///
    /// With a runtime handle, decoding runs on its blocking pool; without one it runs inline
    /// inside [`BackgroundLoader::request`] and the result is available on the next poll.
    pub fn new(runtime: Option<tokio::runtime::Handle>) -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver: Some(receiver),
            runtime,
            next_ticket: 0,
            latest: None,
        }
    }

    /// Starts decoding `url` and returns the request's ticket.
    ///
    /// Any earlier request is superseded: its result will be dropped when it arrives.
    pub fn request(&mut self, url: &str) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.latest = Some(ticket);

        let sender = self.sender.clone();
        let url = url.to_string();
        let job = move || {
            let outcome = DecodedImage::load(&url).map(Arc::new);
            // The receiver is gone after detach; nothing left to deliver to.
            let _ = sender.send(DecodeResult {
                ticket,
                url,
                outcome,
            });
        };
        match &self.runtime {
            Some(handle) => {
                handle.spawn_blocking(job);
            }
            None => job(),
        }
        log::debug!("background decode #{ticket} requested");
        ticket
    }

    /// Forgets the outstanding request, so its result is dropped on arrival.
    pub fn cancel(&mut self) {
        self.latest = None;
    }

    /// Whether a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.latest.is_some()
    }

    /// Drains finished decodes and returns the result of the latest request, if it arrived.
    pub fn poll(&mut self) -> Option<DecodeResult> {
        let receiver = self.receiver.as_ref()?;
        let mut current = None;
        while let Ok(result) = receiver.try_recv() {
            if Some(result.ticket) == self.latest {
                current = Some(result);
            } else {
                log::debug!("dropping superseded background decode #{}", result.ticket);
            }
        }
        if current.is_some() {
            self.latest = None;
        }
        current
    }

    /// Disconnects the result channel; pending and future completions are discarded.
    pub fn detach(&mut self) {
        self.receiver = None;
        self.latest = None;
    }

    /// Reconnects a detached loader with a fresh channel.
    pub fn attach(&mut self) {
        if self.receiver.is_none() {
            let (sender, receiver) = channel();
            self.sender = sender;
            self.receiver = Some(receiver);
        }
    }

    /// Whether results are currently delivered.
    pub fn is_attached(&self) -> bool {
        self.receiver.is_some()
    }
}
