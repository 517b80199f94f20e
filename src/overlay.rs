//! The floating candidate list, as seen from the engine.
//!
//! The assistant box decides when the list opens and where it is anchored;
//! how it is drawn is up to the host surface.

/// Where the overlay should appear, relative to the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayAnchor {
    /// Byte offset of the mention marker in the buffer
    pub offset: usize,
    /// Display column of the marker (terminal cells from the start of the line)
    pub column: usize,
}

pub trait Overlay {
    /// Show (or move) the overlay at `anchor`
    fn open(&mut self, anchor: OverlayAnchor);
    fn close(&mut self);
}

/// Remembers the last anchor; enough for a host that redraws every frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchoredOverlay {
    anchor: Option<OverlayAnchor>,
}

impl AnchoredOverlay {
    pub fn anchor(&self) -> Option<OverlayAnchor> {
        self.anchor
    }

    pub fn is_open(&self) -> bool {
        self.anchor.is_some()
    }
}

impl Overlay for AnchoredOverlay {
    fn open(&mut self, anchor: OverlayAnchor) {
        self.anchor = Some(anchor);
    }

    fn close(&mut self) {
        self.anchor = None;
    }
}
