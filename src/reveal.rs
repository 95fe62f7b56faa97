use std::time::Duration;

/// Reveals a message one character per interval.
#[derive(Debug, Clone)]
pub struct TextReveal {
    chars: Vec<char>,
    revealed: usize,
    interval: Duration,
    elapsed: Duration,
}

impl TextReveal {
    pub fn new(message: &str, interval: Duration) -> Self {
        Self {
            chars: message.chars().collect(),
            revealed: 0,
            interval,
            elapsed: Duration::ZERO,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn is_finished(&self) -> bool {
        self.revealed >= self.chars.len()
    }

    pub fn visible_text(&self) -> String {
        self.chars[..self.revealed].iter().collect()
    }

    /// Shows one more character. Returns false once the full text is visible.
    pub fn tick(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.revealed += 1;
        true
    }

    /// Feeds wall-clock time in; fires one tick per elapsed interval.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.is_finished() {
            return false;
        }
        self.elapsed += dt;
        let mut changed = false;
        while self.elapsed >= self.interval && !self.is_finished() {
            self.elapsed -= self.interval;
            changed |= self.tick();
        }
        if self.is_finished() {
            self.elapsed = Duration::ZERO;
        }
        changed
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        if self.is_finished() {
            None
        } else {
            Some(self.interval.saturating_sub(self.elapsed))
        }
    }
}
