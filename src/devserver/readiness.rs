//! Readiness detection over chunked process output.
//!
//! Dev servers announce availability with a line of log text, but the OS
//! hands that text back in arbitrarily segmented chunks. The detector keeps
//! a rolling tail from the previous chunk so a marker split across a chunk
//! boundary is still recognized, and it fires at most once no matter how
//! often the marker text recurs afterwards.

/// Watches one service's output stream for its readiness marker.
#[derive(Debug)]
pub struct ReadinessDetector {
    marker: String,
    tail: String,
    fired: bool,
}

impl ReadinessDetector {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            tail: String::new(),
            fired: false,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether the marker has already been seen.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Feed one output chunk. Returns `true` exactly once, on the chunk
    /// where the marker first completes; the detector is inert afterwards.
    pub fn observe(&mut self, chunk: &str) -> bool {
        if self.fired {
            return false;
        }

        let mut window = std::mem::take(&mut self.tail);
        window.push_str(chunk);

        if window.contains(&self.marker) {
            self.fired = true;
            return true;
        }

        // Keep marker-length minus one trailing bytes so a marker straddling
        // the next chunk boundary still matches. The cut must land on a char
        // boundary; log output is not guaranteed to be ASCII.
        let keep = self.marker.len().saturating_sub(1).min(window.len());
        let mut cut = window.len() - keep;
        while !window.is_char_boundary(cut) {
            cut -= 1;
        }
        self.tail = window.split_off(cut);
        false
    }
}

/// Filters known-noisy diagnostic lines out of surfaced stderr output.
///
/// Filtering affects what is shown to the operator, never what is scanned:
/// a line dropped here is still fed to the readiness detector.
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    patterns: Vec<String>,
}

impl NoiseFilter {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| line.contains(p.as_str()))
    }
}
