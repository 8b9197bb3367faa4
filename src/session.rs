// Per-session coordination for insight generation: at most one request in
// flight, and results arriving for a superseded chart configuration are
// dropped instead of displayed.

/// Identifies one insight request against the configuration it was issued
/// under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

/// Tracks the insight request lifecycle for a single user session.
///
/// The surrounding UI calls `begin` on Generate, `invalidate` whenever the
/// chart configuration changes, and `finish` when a result arrives; a
/// `false` from `finish` means the result is stale and must be discarded.
#[derive(Debug, Default)]
pub struct InsightSession {
    generation: u64,
    in_flight: bool,
}

impl InsightSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request. Returns `None` while another request is pending;
    /// a second Generate click is ignored rather than fired concurrently.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(Ticket {
            generation: self.generation,
        })
    }

    /// Record a chart configuration change. Any outstanding ticket becomes
    /// stale; its eventual result will be rejected by `finish`.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Complete the request identified by `ticket`. Returns whether its
    /// result is still current and may be displayed.
    pub fn finish(&mut self, ticket: &Ticket) -> bool {
        self.in_flight = false;
        ticket.generation == self.generation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}
