// Application state management
//
// AppState owns the graph model, viewport, interaction controller and
// animation table, and is the single writer to all of them. Stream messages
// arrive over a channel and are folded in once per UI tick.

pub mod animation;
pub mod config;
pub mod event;

pub use animation::{FlowAnimation, PARTICLES_PER_EDGE};
pub use config::{FlowMapSettings, RefreshConfig};

use crate::flow::{FlowEvent, StreamMessage};
use crate::graph::{GraphModel, NamespaceFilter, Node};
use crate::session::{open_stream, Session, SessionDirectory, SessionError, SessionRequest, StreamHandle};
use crate::viewport::interaction::{InteractionController, WheelDirection};
use crate::viewport::{Point, ViewportTransform};
use config::{FRAME_TIME_THRESHOLD_MS, NOTICE_DURATION, SLOW_FRAME_COUNT_THRESHOLD};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use std::collections::BTreeSet;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Surface units per terminal column (Braille dots across a cell)
pub const UNITS_PER_COLUMN: f64 = 2.0;

/// Surface units per terminal row (Braille dots down a cell)
pub const UNITS_PER_ROW: f64 = 4.0;

/// Wall-clock milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Main application state
pub struct AppState {
    /// Whether the application is running
    pub running: bool,

    sessions: Box<dyn SessionDirectory>,

    /// Snapshot of the session directory, refreshed on lifecycle changes
    pub session_list: Vec<Session>,

    /// Id of the session whose stream feeds the map
    pub active_session: Option<String>,

    stream: Option<StreamHandle>,

    /// Keep reading sources at end of input
    follow: bool,

    pub graph: GraphModel,

    pub viewport: ViewportTransform,

    pub interaction: InteractionController,

    pub animation: FlowAnimation,

    /// Selected namespaces; empty shows everything
    pub namespace_filter: NamespaceFilter,

    /// List state for the namespace filter panel
    pub namespace_list_state: ListState,

    /// Dismissible error from the stream or session collaborator
    pub error_banner: Option<String>,

    /// Transient status line (session ended, stopped, ...)
    notice: Option<(String, Instant)>,

    pub settings: FlowMapSettings,

    pub refresh_config: RefreshConfig,

    /// Inner terminal area of the flow map, set by the renderer
    pub map_area: Rect,

    /// Frame time tracking for performance monitoring
    last_frame_time: Instant,

    /// Counter for consecutive slow frames (frame time > 100ms)
    slow_frame_count: u32,

    /// Whether animation complexity has been auto-reduced due to performance
    /// When true, only one particle per edge is drawn
    pub animation_reduced: bool,
}

impl AppState {
    pub fn new(sessions: Box<dyn SessionDirectory>, follow: bool, refresh_ms: u64) -> Self {
        let session_list = sessions.list_sessions();
        Self {
            running: true,
            sessions,
            session_list,
            active_session: None,
            stream: None,
            follow,
            graph: GraphModel::new(),
            viewport: ViewportTransform::new(),
            interaction: InteractionController::new(),
            animation: FlowAnimation::new(),
            namespace_filter: NamespaceFilter::new(),
            namespace_list_state: ListState::default(),
            error_banner: None,
            notice: None,
            settings: FlowMapSettings::default(),
            refresh_config: RefreshConfig::with_interval(refresh_ms),
            map_area: Rect::default(),
            last_frame_time: Instant::now(),
            slow_frame_count: 0,
            animation_reduced: false,
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Start a session; the first one started becomes active
    pub fn start_session(&mut self, request: SessionRequest) -> Result<(), SessionError> {
        let session = self.sessions.start_session(request)?;
        self.refresh_sessions();
        if self.active_session.is_none() {
            self.activate_session(&session.id);
        }
        Ok(())
    }

    /// Switch the map to another session, discarding the current model
    pub fn activate_session(&mut self, id: &str) {
        self.stream = None;
        self.reset_view_model();
        self.active_session = Some(id.to_string());

        let opened = self
            .sessions
            .stream_url(id)
            .and_then(|url| open_stream(&url, self.follow));
        match opened {
            Ok(stream) => {
                info!(id, "Activated session");
                self.stream = Some(stream);
            }
            Err(e) => {
                warn!(error = %e, id, "Cannot open session stream");
                self.error_banner = Some(e.to_string());
            }
        }
    }

    /// Cycle to the session after the active one, or to the first when
    /// none is active
    pub fn next_session(&mut self) {
        let current = self
            .active_session
            .as_ref()
            .and_then(|id| self.session_list.iter().position(|s| &s.id == id));
        let next = match current {
            Some(_) if self.session_list.len() < 2 => return,
            Some(i) => (i + 1) % self.session_list.len(),
            None if self.session_list.is_empty() => return,
            None => 0,
        };
        let id = self.session_list[next].id.clone();
        self.activate_session(&id);
    }

    /// Stop the active session and clear the map; the session leaves the list
    pub fn stop_active_session(&mut self) {
        let Some(id) = self.active_session.clone() else {
            return;
        };
        match self.sessions.stop_session(&id) {
            Ok(()) => {
                info!(id, "Stopped active session");
                self.stream = None;
                self.reset_view_model();
                self.active_session = None;
                self.set_notice("Session stopped");
            }
            Err(e) => {
                warn!(error = %e, id, "Cannot stop session");
                self.error_banner = Some(e.to_string());
            }
        }
        self.refresh_sessions();
    }

    pub fn refresh_sessions(&mut self) {
        self.session_list = self.sessions.list_sessions();
    }

    pub fn active(&self) -> Option<&Session> {
        let id = self.active_session.as_ref()?;
        self.session_list.iter().find(|s| &s.id == id)
    }

    // ========================================================================
    // Ticks and stream messages
    // ========================================================================

    /// Update state on each UI tick
    pub fn on_tick(&mut self) {
        self.on_tick_at(now_millis());
    }

    pub fn on_tick_at(&mut self, now: u64) {
        // The reader clears the flag after its last send, so check it before
        // draining
        let (messages, finished) = match &self.stream {
            Some(stream) => {
                let finished = !stream.is_active();
                (stream.drain(), finished)
            }
            None => (Vec::new(), false),
        };
        self.apply_messages(messages, now);
        if finished {
            debug!(session = ?self.active_session, "Session stream closed");
            self.stream = None;
        }

        self.animation.tick(&self.graph, self.settings.paused);

        if self
            .notice
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTICE_DURATION)
        {
            self.notice = None;
        }
    }

    /// Route control messages and ingest the flow events as one batch
    pub fn apply_messages(&mut self, messages: Vec<StreamMessage>, now: u64) {
        let mut batch = Vec::new();

        for message in messages {
            match message {
                StreamMessage::Flow(event) => batch.push(event),
                StreamMessage::Error { message } => {
                    warn!(%message, "Session stream reported an error");
                    self.error_banner = Some(message);
                }
                StreamMessage::SessionEnded { status } => {
                    info!(%status, "Session ended");
                    if let Some(id) = self.active_session.clone() {
                        self.sessions.session_ended(&id);
                    }
                    self.refresh_sessions();
                    self.set_notice(format!("Session ended ({})", status));
                }
            }
        }

        if batch.is_empty() {
            self.graph.evict_stale(now);
            return;
        }

        self.graph.ingest(&batch, now, &self.namespace_filter);
    }

    fn reset_view_model(&mut self) {
        self.graph.reset();
        self.animation.clear();
        self.interaction.reset();
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some((text.into(), Instant::now()));
    }

    pub fn dismiss_banner(&mut self) {
        self.error_banner = None;
    }

    // ========================================================================
    // Namespace filter
    // ========================================================================

    /// Namespaces offered for selection: observed ones plus any still selected
    pub fn namespace_entries(&self) -> Vec<String> {
        let entries: BTreeSet<&String> = self
            .graph
            .observed_namespaces()
            .iter()
            .chain(self.namespace_filter.iter())
            .collect();
        entries.into_iter().cloned().collect()
    }

    /// Move namespace selection up (decrease index)
    pub fn select_previous_namespace(&mut self) {
        let count = self.namespace_entries().len();
        if count == 0 {
            self.namespace_list_state.select(None);
            return;
        }
        let idx = match self.namespace_list_state.selected() {
            None => count - 1,
            Some(idx) => idx.min(count - 1).saturating_sub(1),
        };
        self.namespace_list_state.select(Some(idx));
    }

    /// Move namespace selection down (increase index)
    pub fn select_next_namespace(&mut self) {
        let count = self.namespace_entries().len();
        if count == 0 {
            self.namespace_list_state.select(None);
            return;
        }
        let idx = match self.namespace_list_state.selected() {
            None => 0,
            Some(idx) => (idx + 1).min(count - 1),
        };
        self.namespace_list_state.select(Some(idx));
    }

    /// Toggle the namespace under the cursor
    ///
    /// Only later batches are filtered on ingest; what is already in the
    /// model is hidden or shown again, never dropped.
    pub fn toggle_selected_namespace(&mut self) {
        let entries = self.namespace_entries();
        let Some(namespace) = self
            .namespace_list_state
            .selected()
            .and_then(|idx| entries.get(idx))
        else {
            return;
        };

        if !self.namespace_filter.remove(namespace) {
            self.namespace_filter.insert(namespace.clone());
        }
        self.apply_namespace_filter();
    }

    pub fn clear_namespace_filter(&mut self) {
        if self.namespace_filter.is_empty() {
            return;
        }
        self.namespace_filter.clear();
        self.apply_namespace_filter();
    }

    fn apply_namespace_filter(&mut self) {
        info!(filter = ?self.namespace_filter, "Namespace filter changed");
        self.graph.set_view_filter(self.namespace_filter.clone());
        // A hidden node cannot stay hovered or dragged
        let grabbed = self.interaction.dragged().or(self.interaction.hovered()).is_some();
        if grabbed && self.inspected_node().is_none() {
            self.interaction.pointer_leave();
        }
    }

    // ========================================================================
    // Map geometry and pointer input
    // ========================================================================

    /// Record where the map is drawn and size the layout surface to match
    pub fn set_map_area(&mut self, area: Rect) {
        self.map_area = area;
        self.graph.resize(
            f64::from(area.width) * UNITS_PER_COLUMN,
            f64::from(area.height) * UNITS_PER_ROW,
        );
    }

    /// Center of the drawing surface in screen units
    pub fn surface_center(&self) -> Point {
        Point::new(
            f64::from(self.map_area.width) * UNITS_PER_COLUMN / 2.0,
            f64::from(self.map_area.height) * UNITS_PER_ROW / 2.0,
        )
    }

    /// Screen point at the center of terminal cell (column, row), if the cell
    /// is inside the map
    pub fn screen_point(&self, column: u16, row: u16) -> Option<Point> {
        let area = self.map_area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| {
            Point::new(
                f64::from(column - area.x) * UNITS_PER_COLUMN + UNITS_PER_COLUMN / 2.0,
                f64::from(row - area.y) * UNITS_PER_ROW + UNITS_PER_ROW / 2.0,
            )
        })
    }

    pub fn pointer_down(&mut self, column: u16, row: u16) {
        let center = self.surface_center();
        match self.screen_point(column, row) {
            Some(screen) => self
                .interaction
                .pointer_down(screen, center, &self.graph, &self.viewport),
            None => self.interaction.pointer_leave(),
        }
    }

    pub fn pointer_move(&mut self, column: u16, row: u16) {
        let center = self.surface_center();
        match self.screen_point(column, row) {
            Some(screen) => {
                self.interaction
                    .pointer_move(screen, center, &mut self.graph, &mut self.viewport)
            }
            None => self.interaction.pointer_leave(),
        }
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }

    pub fn wheel(&mut self, direction: WheelDirection) {
        self.interaction.wheel(direction, &mut self.viewport);
    }

    /// Node shown in the inspector: the one being dragged, else the hovered one
    pub fn inspected_node(&self) -> Option<&Node> {
        let id = self.interaction.dragged().or(self.interaction.hovered())?;
        self.graph
            .node(id)
            .filter(|node| self.graph.is_node_visible(node))
    }

    // ========================================================================
    // Refresh rate and frame time
    // ========================================================================

    /// Increase refresh rate (decrease interval, clamped to the minimum)
    pub fn increase_refresh_rate(&mut self) {
        let new_interval = self
            .refresh_config
            .refresh_ms
            .saturating_sub(config::REFRESH_STEP);
        self.refresh_config.refresh_ms = new_interval.max(config::MIN_REFRESH_MS);
        self.refresh_config.last_change = Some(Instant::now());
    }

    /// Decrease refresh rate (increase interval, clamped to the maximum)
    pub fn decrease_refresh_rate(&mut self) {
        let new_interval = self
            .refresh_config
            .refresh_ms
            .saturating_add(config::REFRESH_STEP);
        self.refresh_config.refresh_ms = new_interval.min(config::MAX_REFRESH_MS);
        self.refresh_config.last_change = Some(Instant::now());
    }

    /// Update frame time tracking and auto-reduce animation complexity if needed
    ///
    /// Called at the start of each frame render. After
    /// SLOW_FRAME_COUNT_THRESHOLD consecutive frames slower than
    /// FRAME_TIME_THRESHOLD_MS, edges draw a single particle.
    pub fn update_frame_time(&mut self) {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time).as_millis();
        self.last_frame_time = now;
        self.record_frame_time(frame_time);
    }

    fn record_frame_time(&mut self, frame_time: u128) {
        if frame_time > FRAME_TIME_THRESHOLD_MS {
            self.slow_frame_count += 1;

            if self.slow_frame_count >= SLOW_FRAME_COUNT_THRESHOLD && !self.animation_reduced {
                self.animation_reduced = true;
                info!(
                    frame_time_ms = frame_time,
                    slow_frame_count = self.slow_frame_count,
                    "Auto-reducing animation complexity due to slow frame times"
                );
            }
        } else if !self.animation_reduced {
            self.slow_frame_count = 0;
        }
    }

    /// Reset animation complexity reduction
    ///
    /// Called when the user resumes animation, to try full complexity again.
    pub fn reset_animation_reduction(&mut self) {
        self.animation_reduced = false;
        self.slow_frame_count = 0;
    }

    /// Particles drawn per edge this frame
    pub fn particles_per_edge(&self) -> usize {
        if self.animation_reduced {
            1
        } else {
            PARTICLES_PER_EDGE
        }
    }
}
