//! Drag tracking for the overlay text.
//!
//! A drag captures the committed position as its origin, follows the
//! cumulative pointer delta clamped to the image tile, and commits the
//! final clamped position to the owning draft on release.
use log::{debug, trace};

use crate::{GestureDelta, Position, QuoteStore, Size};

/// Scale applied to the overlay while it is being dragged.
pub const DRAG_SCALE: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    /// Overlay rests at its committed position
    Idle,
    /// A gesture is in progress
    Dragging {
        /// Committed position when the gesture started
        origin: Position,
    },
}

/// Tracks one overlay on one image tile.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    /// Draft whose position this tracker owns
    quote_id: String,
    container: Size,
    text: Size,
    committed: Position,
    live: Position,
    state: DragState,
}

impl PositionTracker {
    /// Creates an idle tracker for `quote_id`, resting at `position`.
    pub fn new(
        quote_id: impl Into<String>,
        container: Size,
        text: Size,
        position: Position,
    ) -> Self {
        Self {
            quote_id: quote_id.into(),
            container,
            text,
            committed: position,
            live: position,
            state: DragState::Idle,
        }
    }

    /// Creates a tracker for a draft in `store`, starting from its stored
    /// position. Returns `None` when there is no such draft.
    pub fn for_draft(store: &QuoteStore, quote_id: &str, text: Size) -> Option<Self> {
        let draft = store.draft(quote_id)?;
        let layout = store.layout();
        let position = draft.text_position.unwrap_or_else(|| layout.centered());
        Some(Self::new(quote_id, layout.container, text, position))
    }

    pub fn quote_id(&self) -> &str {
        &self.quote_id
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Where the overlay is drawn right now.
    pub fn live_position(&self) -> Position {
        self.live
    }

    /// Last position written back to the draft.
    pub fn committed_position(&self) -> Position {
        self.committed
    }

    /// Overlay scale; cosmetic only.
    pub fn scale(&self) -> f64 {
        if self.is_dragging() {
            DRAG_SCALE
        } else {
            1.0
        }
    }

    /// Records a fresh measurement of the overlay. Must be called whenever
    /// the text or author changes so clamping uses the current size.
    pub fn measure_text(&mut self, text: Size) {
        trace!("Overlay measured at {}x{}", text.width, text.height);
        self.text = text;
    }

    /// Changes the tile size. An idle overlay is not moved; the next drag
    /// clamps against the new bounds.
    pub fn resize_container(&mut self, container: Size) {
        debug!(
            "Tile resized to {}x{}; committed position left as is",
            container.width, container.height
        );
        self.container = container;
    }

    /// Starts a drag from the committed position. A second start while
    /// already dragging keeps the original origin.
    pub fn begin_drag(&mut self) {
        if self.is_dragging() {
            return;
        }
        self.state = DragState::Dragging {
            origin: self.committed,
        };
        self.live = self.committed;
        trace!("Drag started for {}", self.quote_id);
    }

    /// Applies the cumulative delta since the drag started and returns the
    /// clamped live position. Ignored while idle.
    pub fn drag_move(&mut self, delta: GestureDelta) -> Position {
        if let DragState::Dragging { origin } = self.state {
            let candidate = Position::new(origin.x + delta.dx, origin.y + delta.dy);
            self.live = self.clamp(candidate);
        }
        self.live
    }

    /// Ends the drag, commits the clamped position to the draft in `store`
    /// and returns it. Ending while idle commits nothing.
    pub fn end_drag(&mut self, store: &mut QuoteStore) -> Position {
        if !self.is_dragging() {
            return self.committed;
        }

        self.state = DragState::Idle;
        self.committed = self.live;
        store.update_position(&self.quote_id, self.committed);
        debug!(
            "Drag ended for {} at ({}, {})",
            self.quote_id, self.committed.x, self.committed.y
        );
        self.committed
    }

    /// Abandons the drag and snaps back to the committed position.
    pub fn cancel_drag(&mut self) {
        self.state = DragState::Idle;
        self.live = self.committed;
    }

    fn clamp(&self, candidate: Position) -> Position {
        clamp_to_bounds(candidate, self.container, self.text)
    }
}

/// Clamps `candidate` so a `text` box stays inside `container`. When the
/// text is larger than the container it is pinned to the top-left edge.
pub fn clamp_to_bounds(candidate: Position, container: Size, text: Size) -> Position {
    let max_x = (container.width - text.width).max(0.0);
    let max_y = (container.height - text.height).max(0.0);
    Position::new(candidate.x.clamp(0.0, max_x), candidate.y.clamp(0.0, max_y))
}
