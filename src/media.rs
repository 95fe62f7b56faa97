use anyhow::Result;
use std::time::Duration;

/// An open media handle as seen by the app.
///
/// Backends report readiness, end of media and errors asynchronously as
/// [`crate::controller::PlaybackEvent`]s; the position is polled once per frame.
pub trait MediaSession {
    fn play(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    /// Only takes effect once the media has reported ready.
    fn set_rate(&self, rate: f64) -> Result<()>;
    fn position(&self) -> Option<Duration>;
}
