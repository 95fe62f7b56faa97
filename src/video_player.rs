use crate::controller::PlaybackEvent;
use crate::media::MediaSession;
use anyhow::{anyhow, Result};
use eframe::epaint::ColorImage;
use gstreamer::prelude::*;
use gstreamer::{glib, Bin, ClockTime, Element, ElementFactory, MessageView, SeekFlags, SeekType, State};
use gstreamer_app::AppSink;
use gstreamer_video::{VideoFrame, VideoInfo};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const BUS_POLL_INTERVAL: ClockTime = ClockTime::from_mseconds(100);

pub struct VideoPlayer {
    pipeline: Element,
}

impl VideoPlayer {
    /// Builds a player for a local file.
    pub fn open(
        path: &Path,
        events: mpsc::UnboundedSender<PlaybackEvent>,
        texture_sender: watch::Sender<Option<ColorImage>>,
    ) -> Result<Self> {
        let abs_path = dunce::canonicalize(path)
            .map_err(|e| anyhow!("Failed to canonicalize path {}: {}", path.display(), e))?;
        let uri = glib::filename_to_uri(&abs_path, None)
            .map_err(|e| anyhow!("Failed to convert path to URI {}: {}", abs_path.display(), e))?;
        info!("Loading video {}", abs_path.display());
        Self::new(uri.as_str(), events, texture_sender)
    }

    pub fn new(
        uri: &str,
        events: mpsc::UnboundedSender<PlaybackEvent>,
        texture_sender: watch::Sender<Option<ColorImage>>,
    ) -> Result<Self> {
        debug!("Creating pipeline for URI: {}", uri);

        let pipeline = ElementFactory::make("playbin")
            .name("playbin")
            .build()
            .map_err(|e| anyhow!("Failed to create playbin: {:?}", e))?;
        pipeline.set_property("uri", uri);

        let video_bin = Bin::new();

        let videoconvert = ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| anyhow!("Failed to create videoconvert: {:?}", e))?;
        let videoscale = ElementFactory::make("videoscale")
            .build()
            .map_err(|e| anyhow!("Failed to create videoscale: {:?}", e))?;

        // Frames are uploaded to egui as RGBA
        let capsfilter = ElementFactory::make("capsfilter")
            .build()
            .map_err(|e| anyhow!("Failed to create capsfilter: {:?}", e))?;
        capsfilter.set_property(
            "caps",
            &gstreamer::Caps::builder("video/x-raw")
                .field("format", "RGBA")
                .build(),
        );

        let appsink = AppSink::builder().build();
        appsink.set_max_buffers(1);
        appsink.set_drop(true);

        let appsink_element = appsink.clone().upcast::<Element>();
        video_bin
            .add_many([&videoconvert, &videoscale, &capsfilter, &appsink_element])
            .map_err(|e| anyhow!("Failed to add video elements: {:?}", e))?;
        Element::link_many([&videoconvert, &videoscale, &capsfilter, &appsink_element])
            .map_err(|e| anyhow!("Failed to link video elements: {:?}", e))?;

        let pad = videoconvert
            .static_pad("sink")
            .ok_or_else(|| anyhow!("Failed to get sink pad"))?;
        let ghost_pad = gstreamer::GhostPad::with_target(&pad)
            .map_err(|e| anyhow!("Failed to create ghost pad: {:?}", e))?;
        video_bin
            .add_pad(&ghost_pad)
            .map_err(|e| anyhow!("Failed to add ghost pad: {:?}", e))?;
        pipeline.set_property("video-sink", &video_bin);

        let audiosink = ElementFactory::make("autoaudiosink")
            .build()
            .map_err(|e| anyhow!("Failed to create audio sink: {:?}", e))?;
        pipeline.set_property("audio-sink", &audiosink);

        let player = VideoPlayer { pipeline };
        player.start_bus_watching(events)?;
        player.start_frame_extraction(appsink, texture_sender);

        Ok(player)
    }

    fn start_bus_watching(&self, events: mpsc::UnboundedSender<PlaybackEvent>) -> Result<()> {
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| anyhow!("Pipeline has no bus"))?;
        let weak_pipeline = self.pipeline.downgrade();

        // Wakes up periodically so the thread ends once the player is dropped,
        // even if end of stream never comes.
        std::thread::spawn(move || {
            let mut prerolled = false;
            loop {
                let Some(msg) = bus.timed_pop(BUS_POLL_INTERVAL) else {
                    if weak_pipeline.upgrade().is_none() || events.is_closed() {
                        break;
                    }
                    continue;
                };
                match msg.view() {
                    MessageView::AsyncDone(_) if !prerolled => {
                        prerolled = true;
                        let Some(pipeline) = weak_pipeline.upgrade() else {
                            break;
                        };
                        let duration = pipeline
                            .query_duration::<ClockTime>()
                            .map(|d| Duration::from_nanos(d.nseconds()));
                        if events.send(PlaybackEvent::Ready(duration)).is_err() {
                            break;
                        }
                    }
                    MessageView::Eos(_) => {
                        info!("End of stream reached");
                        let _ = events.send(PlaybackEvent::EndOfMedia);
                        break;
                    }
                    MessageView::Error(err) => {
                        let error_msg = format!(
                            "Error from {:?}: {} ({:?})",
                            err.src().map(|s| s.path_string()),
                            err.error(),
                            err.debug()
                        );
                        if events.send(PlaybackEvent::Error(error_msg)).is_err() {
                            break;
                        }
                    }
                    MessageView::Warning(warn) => {
                        warn!(
                            "Warning from {:?}: {} ({:?})",
                            warn.src().map(|s| s.path_string()),
                            warn.error(),
                            warn.debug()
                        );
                    }
                    MessageView::StateChanged(state_changed) => {
                        if let Some(element) = msg.src() {
                            if element.type_().name() == "GstPlayBin" {
                                debug!(
                                    "Pipeline state changed from {:?} to {:?}",
                                    state_changed.old(),
                                    state_changed.current()
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
            debug!("Bus watch finished");
        });
        Ok(())
    }

    /// Playback rate can only change through a seek once the pipeline has prerolled.
    fn apply_rate(pipeline: &Element, rate: f64) -> Result<()> {
        let position = pipeline
            .query_position::<ClockTime>()
            .unwrap_or(ClockTime::ZERO);
        pipeline
            .seek(
                rate,
                SeekFlags::FLUSH | SeekFlags::ACCURATE,
                SeekType::Set,
                position,
                SeekType::End,
                ClockTime::ZERO,
            )
            .map_err(|e| anyhow!("Failed to set playback rate {}: {:?}", rate, e))?;
        info!("Playback rate set to {}", rate);
        Ok(())
    }

    fn start_frame_extraction(
        &self,
        appsink: AppSink,
        sender: watch::Sender<Option<ColorImage>>,
    ) {
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    match Self::pull_frame(appsink) {
                        Some(frame) => {
                            // No receiver left once the window is gone
                            let _ = sender.send(Some(frame));
                        }
                        None => {
                            warn!("Failed to pull frame");
                        }
                    }
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );
    }

    fn pull_frame(appsink: &AppSink) -> Option<ColorImage> {
        let sample = appsink.pull_sample().ok()?;
        let buffer = sample.buffer()?;
        let caps = sample.caps()?;
        let video_info = VideoInfo::from_caps(caps).ok()?;

        let frame = VideoFrame::from_buffer_readable(buffer.copy(), &video_info).ok()?;

        let width = video_info.width() as usize;
        let height = video_info.height() as usize;
        let stride = frame.plane_stride()[0] as usize;
        let plane_data = frame.plane_data(0).ok()?;

        if stride == width * 4 {
            return Some(ColorImage::from_rgba_unmultiplied([width, height], plane_data));
        }
        let mut pixels = Vec::with_capacity(width * height * 4);
        for row in plane_data.chunks(stride).take(height) {
            pixels.extend_from_slice(&row[..width * 4]);
        }
        Some(ColorImage::from_rgba_unmultiplied([width, height], &pixels))
    }
}

impl MediaSession for VideoPlayer {
    fn play(&self) -> Result<()> {
        info!("Setting pipeline to PLAYING state");
        self.pipeline
            .set_state(State::Playing)
            .map_err(|e| anyhow!("Failed to set pipeline to PLAYING: {:?}", e))?;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        info!("Stopping pipeline");
        let _ = self.pipeline.set_state(State::Paused);
        self.pipeline
            .set_state(State::Null)
            .map_err(|e| anyhow!("Failed to set pipeline to NULL: {:?}", e))?;
        Ok(())
    }

    fn set_rate(&self, rate: f64) -> Result<()> {
        Self::apply_rate(&self.pipeline, rate)
    }

    fn position(&self) -> Option<Duration> {
        self.pipeline
            .query_position::<ClockTime>()
            .map(|p| Duration::from_nanos(p.nseconds()))
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        debug!("Dropping VideoPlayer, cleaning up pipeline");
        let _ = self.stop();
    }
}
