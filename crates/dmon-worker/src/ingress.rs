//! Detection ingress.
//!
//! Reads newline-delimited JSON detection records, decodes their frames and
//! forwards them to the tracker. Also drives the liveness tick: a periodic
//! frame-rate log line and, when configured, a health check ping.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use dmon_models::{BoundingBox, DetectionEvent, Frame};
use dmon_notifier::HealthPing;

use crate::cli::STDIN_INPUT;
use crate::config::ModelConfig;
use crate::error::{WorkerError, WorkerResult};

/// One detection as produced by the object detector.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionRecord {
    /// Capture time; defaults to the time the record is read
    #[serde(default)]
    pub t: Option<DateTime<Utc>>,
    pub model_id: i64,
    pub classification: String,
    /// Whether the detector has confirmed this object
    #[serde(default)]
    pub is_track: bool,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Base64-encoded image file (JPEG or PNG)
    #[serde(default)]
    pub image: Option<String>,
    /// Frame number; consecutive records with the same number share one image
    #[serde(default)]
    pub frame: Option<u64>,
}

impl DetectionRecord {
    pub fn parse(line: &str) -> WorkerResult<Self> {
        serde_json::from_str(line).map_err(|e| WorkerError::invalid_record(e.to_string()))
    }
}

/// Decode a base64-encoded image file into an RGB frame.
pub fn decode_frame(encoded: &str) -> WorkerResult<Frame> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| WorkerError::invalid_record(format!("image is not valid base64: {}", e)))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| WorkerError::invalid_record(format!("error decoding image: {}", e)))?;
    Ok(Arc::new(image.to_rgb8()))
}

/// Frame counter for the periodic liveness report.
#[derive(Debug)]
pub struct LivenessTicker {
    interval: Duration,
    last_tick: Option<DateTime<Utc>>,
    frames: u64,
}

/// Frames processed since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivenessReport {
    pub frames: u64,
    /// `None` on the first tick
    pub fps: Option<f64>,
}

impl LivenessTicker {
    pub fn new(interval_s: f64) -> Self {
        Self {
            interval: Duration::try_milliseconds((interval_s * 1000.0).round() as i64)
                .unwrap_or(Duration::MAX),
            last_tick: None,
            frames: 0,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    /// Returns a report when a tick is due at `now`. The first call always ticks.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<LivenessReport> {
        let fps = match self.last_tick {
            None => None,
            Some(last) if now - last > self.interval => {
                let elapsed = (now - last).num_milliseconds() as f64 / 1000.0;
                Some(self.frames as f64 / elapsed)
            }
            Some(_) => return None,
        };
        let report = LivenessReport {
            frames: self.frames,
            fps,
        };
        self.last_tick = Some(now);
        self.frames = 0;
        Some(report)
    }
}

/// Open `--input`: `-` is stdin, anything else a file path.
pub async fn open_input(input: &str) -> WorkerResult<Box<dyn AsyncBufRead + Send + Unpin>> {
    if input == STDIN_INPUT {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input).await.map_err(|e| {
        WorkerError::config_error(format!("error opening input '{}': {}", input, e))
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Turns detection records into tracker events.
pub struct Ingress {
    events: UnboundedSender<DetectionEvent>,
    pings: UnboundedSender<HealthPing>,
    healthcheck_ping_url: Option<String>,
    liveness: LivenessTicker,
    /// Most recently decoded frame and its frame number
    current_frame: Option<(Option<u64>, Frame)>,
}

impl Ingress {
    pub fn new(
        config: &ModelConfig,
        events: UnboundedSender<DetectionEvent>,
        pings: UnboundedSender<HealthPing>,
    ) -> Self {
        Self {
            events,
            pings,
            healthcheck_ping_url: config.healthcheck_ping_url.clone(),
            liveness: LivenessTicker::new(config.liveness_tick_s),
            current_frame: None,
        }
    }

    /// Build an event from one record, reusing the current frame when the
    /// record names the same frame number.
    pub fn event_from_record(&mut self, record: DetectionRecord) -> WorkerResult<DetectionEvent> {
        let reusable = match (&self.current_frame, record.frame) {
            (Some((Some(current), frame)), Some(number)) if *current == number => {
                Some(Arc::clone(frame))
            }
            _ => None,
        };

        let frame = match reusable {
            Some(frame) => frame,
            None => {
                let encoded = record
                    .image
                    .as_deref()
                    .ok_or_else(|| WorkerError::invalid_record("record has no image"))?;
                let frame = decode_frame(encoded)?;
                self.current_frame = Some((record.frame, Arc::clone(&frame)));
                self.liveness.record_frame();
                frame
            }
        };

        Ok(DetectionEvent::new(
            record.t.unwrap_or_else(Utc::now),
            record.model_id,
            record.classification,
            record.is_track,
            record.bbox,
            frame,
        ))
    }

    fn liveness_tick(&mut self, now: DateTime<Utc>) {
        let Some(report) = self.liveness.tick(now) else {
            return;
        };
        match report.fps {
            Some(fps) => info!(
                frames = report.frames,
                fps = %format!("{:.1}", fps),
                "liveness tick"
            ),
            None => info!("liveness tick"),
        }
        if let Some(url) = &self.healthcheck_ping_url {
            if self.pings.send(HealthPing::new(url.clone())).is_err() {
                warn!("health ping channel closed");
            }
        }
    }

    /// Read records until end of input or until the tracker goes away.
    /// Returns the number of events forwarded.
    pub async fn run<R>(mut self, reader: R) -> WorkerResult<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("reading detection records");
        let mut lines = reader.lines();
        let mut forwarded = 0;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if !line.is_empty() {
                match DetectionRecord::parse(line).and_then(|r| self.event_from_record(r)) {
                    Ok(event) => {
                        debug!(event_id = %event.id, classification = %event.classification, "detection");
                        if self.events.send(event).is_err() {
                            warn!("tracker channel closed; stopping ingress");
                            break;
                        }
                        forwarded += 1;
                    }
                    Err(e) => warn!(error = %e, "skipping detection record"),
                }
            }
            self.liveness_tick(Utc::now());
        }

        Ok(forwarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{ImageOutputFormat, Rgb, RgbImage};
    use tokio::sync::mpsc;

    fn png_base64() -> String {
        let image = RgbImage::from_pixel(4, 4, Rgb([200, 10, 10]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        BASE64.encode(buf.into_inner())
    }

    fn record_line(frame: Option<u64>, image: Option<&str>) -> String {
        let mut value = serde_json::json!({
            "t": "2024-05-01T08:30:00Z",
            "model_id": 7,
            "classification": "car",
            "is_track": true,
            "box": {"a": {"x": 0.1, "y": 0.2}, "b": {"x": 0.5, "y": 0.6}},
        });
        if let Some(frame) = frame {
            value["frame"] = frame.into();
        }
        if let Some(image) = image {
            value["image"] = image.into();
        }
        value.to_string()
    }

    fn ingress() -> (
        Ingress,
        mpsc::UnboundedReceiver<DetectionEvent>,
        mpsc::UnboundedReceiver<HealthPing>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ping_tx, ping_rx) = mpsc::unbounded_channel();
        let config = ModelConfig {
            healthcheck_ping_url: Some("https://hc.example.com/ping".to_string()),
            ..Default::default()
        };
        (Ingress::new(&config, event_tx, ping_tx), event_rx, ping_rx)
    }

    #[test]
    fn test_record_to_event() {
        let (mut ingress, _, _) = ingress();
        let image = png_base64();
        let record = DetectionRecord::parse(&record_line(Some(1), Some(&image))).unwrap();
        let event = ingress.event_from_record(record).unwrap();

        assert_eq!(event.model_id, 7);
        assert_eq!(event.classification, "car");
        assert!(event.is_confirmed);
        assert_eq!(event.bbox, BoundingBox::from_corners(0.1, 0.2, 0.5, 0.6));
        assert_eq!(event.t.to_rfc3339(), "2024-05-01T08:30:00+00:00");
        assert_eq!(event.frame.dimensions(), (4, 4));
    }

    #[test]
    fn test_same_frame_number_shares_image() {
        let (mut ingress, _, _) = ingress();
        let image = png_base64();

        let first = DetectionRecord::parse(&record_line(Some(3), Some(&image))).unwrap();
        let first = ingress.event_from_record(first).unwrap();
        let second = DetectionRecord::parse(&record_line(Some(3), None)).unwrap();
        let second = ingress.event_from_record(second).unwrap();
        assert!(Arc::ptr_eq(&first.frame, &second.frame));

        let other = DetectionRecord::parse(&record_line(Some(4), None)).unwrap();
        assert!(ingress.event_from_record(other).is_err());
    }

    #[test]
    fn test_bad_images_rejected() {
        let (mut ingress, _, _) = ingress();
        let record = DetectionRecord::parse(&record_line(None, Some("!!!"))).unwrap();
        assert!(ingress.event_from_record(record).is_err());

        let not_an_image = BASE64.encode(b"hello");
        let record = DetectionRecord::parse(&record_line(None, Some(&not_an_image))).unwrap();
        assert!(ingress.event_from_record(record).is_err());
    }

    #[test]
    fn test_missing_time_defaults_to_now() {
        let (mut ingress, _, _) = ingress();
        let line = format!(
            r#"{{"model_id": 1, "classification": "person", "box": {{"a": {{"x": 0, "y": 0}}, "b": {{"x": 1, "y": 1}}}}, "image": "{}"}}"#,
            png_base64()
        );
        let before = Utc::now();
        let event = ingress
            .event_from_record(DetectionRecord::parse(&line).unwrap())
            .unwrap();
        assert!(event.t >= before);
        assert!(!event.is_confirmed);
    }

    #[test]
    fn test_liveness_ticker() {
        let start = Utc::now();
        let mut ticker = LivenessTicker::new(30.0);

        let first = ticker.tick(start).unwrap();
        assert_eq!(first.fps, None);

        for _ in 0..60 {
            ticker.record_frame();
        }
        assert!(ticker.tick(start + Duration::seconds(30)).is_none());

        let report = ticker.tick(start + Duration::seconds(40)).unwrap();
        assert_eq!(report.frames, 60);
        assert_eq!(report.fps, Some(1.5));
    }

    #[tokio::test]
    async fn test_run_skips_bad_lines() {
        let (ingress, mut events, mut pings) = ingress();
        let image = png_base64();
        let input = format!(
            "{}\nnot json\n\n{}\n{}\n",
            record_line(Some(1), Some(&image)),
            record_line(Some(1), None),
            record_line(Some(2), None),
        );

        let forwarded = ingress.run(Cursor::new(input.into_bytes())).await.unwrap();
        assert_eq!(forwarded, 2);

        assert!(events.recv().await.is_some());
        assert!(events.recv().await.is_some());
        assert!(events.recv().await.is_none());

        let ping = pings.recv().await.unwrap();
        assert_eq!(ping.url, "https://hc.example.com/ping");
    }
}
