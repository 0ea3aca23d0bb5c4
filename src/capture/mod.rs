/**
 * Capture loop
 *
 * Owns the pipeline context and drives one tracking cycle at a time:
 * local commands -> peer writes -> capture -> correction -> track ->
 * re-seed policy -> gate and integrate -> encode -> publish.
 *
 * Runs as a single task on a current-thread runtime. Suspension points are
 * the connection wait and the short sleep between cycles; shutdown is only
 * observed between cycles.
 */

use std::time::{Duration, Instant};

use bytes::Bytes;
use image::GrayImage;
use nalgebra::Point2;
use tokio::sync::{mpsc, watch};

use crate::camera::Camera;
use crate::channel::{
    ControlChannel, IgnoreWrites, PeerLink, PeerWriteHandler, RecenterOnWrite, TriggerEvent,
};
use crate::config::{PeerWriteAction, TrackerConfig};
use crate::error::{PipelineError, Result};
use crate::input::{CommandSource, LocalCommand};
use crate::telemetry::TelemetryEncoder;
use crate::tracking::{FeatureManager, MotionEstimator, PositionIntegrator, StabilityGate, UpdateOutcome};
use crate::vision::FrameCorrection;

/// Device state built at startup and handed to the loop.
pub struct PipelineContext{
    pub camera: Box<dyn Camera>,
    pub channel: ControlChannel,
    pub triggers: mpsc::UnboundedReceiver<TriggerEvent>,
    pub input: Box<dyn CommandSource>,
    pub correction: Option<Box<dyn FrameCorrection>>,
}

impl PipelineContext{
    pub fn new(camera: Box<dyn Camera>, link: Box<dyn PeerLink>, input: Box<dyn CommandSource>) -> Self{
        let (channel, triggers) = ControlChannel::new(link);
        PipelineContext{
            camera,
            channel,
            triggers,
            input,
            correction: None,
        }
    }

    pub fn with_correction(mut self, correction: Box<dyn FrameCorrection>) -> Self{
        self.correction = Some(correction);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPhase{
    Steady,
    /// The last re-seed found no corners; detection runs again next cycle.
    Reseeding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState{
    Idle,
    WaitingForConnection,
    Initializing,
    Tracking(TrackingPhase),
    Stopped,
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary{
    pub cycles: u64,
    pub skipped_frames: u64,
    pub tracking_failures: u64,
    pub reseeds: u64,
    pub samples: u64,
    pub chunks_published: u64,
}

//cycle rate, logged once a second
struct RateCounter{
    window_start: Instant,
    count: u32,
}

impl RateCounter{
    fn new() -> Self{
        RateCounter{
            window_start: Instant::now(),
            count: 0,
        }
    }

    fn tick(&mut self){
        self.count += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1){
            tracing::debug!("{:.1} cycles/s", self.count as f64 / elapsed.as_secs_f64());
            self.window_start = Instant::now();
            self.count = 0;
        }
    }
}

//local keys are read this often while no peer is connected
const INPUT_POLL: Duration = Duration::from_millis(50);

enum Wake{
    Connected,
    Shutdown,
    Exit,
}

//resolves on the first Exit key; other keys are dropped before tracking starts
async fn exit_key(input: &mut dyn CommandSource){
    let mut tick = tokio::time::interval(INPUT_POLL);
    loop{
        tick.tick().await;
        while let Some(command) = input.poll_command(){
            if command == LocalCommand::Exit{
                return;
            }
        }
    }
}

pub struct CaptureLoop{
    context: PipelineContext,
    estimator: MotionEstimator,
    features: FeatureManager,
    integrator: PositionIntegrator,
    encoder: TelemetryEncoder,
    write_handler: Box<dyn PeerWriteHandler>,
    state: LoopState,
    previous: Option<GrayImage>,
    held: Option<Bytes>,
    cycle_sleep: Duration,
    connect_poll: Duration,
    summary: LoopSummary,
    rate: RateCounter,
}

impl CaptureLoop{
    pub fn new(context: PipelineContext, config: &TrackerConfig) -> Self{
        let (width, height) = context.camera.dimensions();
        let write_handler: Box<dyn PeerWriteHandler> = match config.channel.on_peer_write{
            PeerWriteAction::Ignore => Box::new(IgnoreWrites),
            PeerWriteAction::Recenter => Box::new(RecenterOnWrite),
        };

        CaptureLoop{
            context,
            estimator: MotionEstimator::new(&config.flow),
            features: FeatureManager::new(&config.features),
            integrator: PositionIntegrator::new(width, height, StabilityGate::from(&config.integrator)),
            encoder: TelemetryEncoder::new(&config.telemetry),
            write_handler,
            state: LoopState::Idle,
            previous: None,
            held: None,
            cycle_sleep: Duration::from_millis(config.capture.cycle_sleep_ms),
            connect_poll: Duration::from_millis(config.channel.connect_poll_ms),
            summary: LoopSummary::default(),
            rate: RateCounter::new(),
        }
    }

    pub fn with_write_handler(mut self, handler: Box<dyn PeerWriteHandler>) -> Self{
        self.write_handler = handler;
        self
    }

    pub fn state(&self) -> LoopState{
        self.state
    }

    pub fn position(&self) -> Point2<f32>{
        self.integrator.position()
    }

    pub fn summary(&self) -> &LoopSummary{
        &self.summary
    }

    /// Wait for the peer, then cycle until exit, shutdown or camera loss.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<LoopSummary>{
        self.state = LoopState::WaitingForConnection;
        //stale writes from before start do not count
        while self.context.triggers.try_recv().is_ok() {}

        tracing::info!("waiting for peer connection");
        let wake = {
            let PipelineContext { channel, input, .. } = &mut self.context;
            tokio::select!{
                biased;
                res = channel.wait_for_connection(self.connect_poll) =>{
                    res?;
                    Wake::Connected
                }
                Ok(()) = shutdown.changed() => Wake::Shutdown,
                _ = exit_key(input.as_mut()) => Wake::Exit,
            }
        };
        match wake{
            Wake::Connected => {}
            Wake::Shutdown =>{
                tracing::info!("shutdown before connection");
                self.stop();
                return Ok(self.summary.clone());
            }
            Wake::Exit =>{
                tracing::info!("exit requested before connection");
                self.stop();
                return Ok(self.summary.clone());
            }
        }

        tracing::info!("peer connected, starting capture");
        self.state = LoopState::Initializing;

        loop{
            if *shutdown.borrow(){
                tracing::info!("shutdown requested");
                break;
            }
            self.step();
            if self.state == LoopState::Stopped{
                break;
            }
            tokio::time::sleep(self.cycle_sleep).await;
        }

        self.stop();
        Ok(self.summary.clone())
    }

    /// One cycle. Every failure is handled here; only the state changes.
    pub fn step(&mut self){
        self.summary.cycles += 1;

        while let Some(command) = self.context.input.poll_command(){
            match command{
                LocalCommand::Exit =>{
                    tracing::info!("exit requested");
                    self.state = LoopState::Stopped;
                    return;
                }
                LocalCommand::Recenter => self.recenter(),
            }
        }

        if let Err(err) = self.context.channel.pump(){
            tracing::warn!("link error: {}", err);
        }
        while let Ok(event) = self.context.triggers.try_recv(){
            if self.write_handler.on_peer_write(&event, &mut self.integrator){
                tracing::info!("peer write recentered position");
                self.encoder.begin_path();
            }
        }

        let frame = match self.context.camera.capture(){
            Ok(frame) => frame,
            Err(err) if err.is_recoverable() =>{
                tracing::warn!("{}", PipelineError::CaptureFailure(err));
                self.summary.skipped_frames += 1;
                //the next frame is not consecutive with the last one
                self.previous = None;
                return;
            }
            Err(err) =>{
                tracing::error!("{}", PipelineError::CaptureFailure(err));
                self.state = LoopState::Stopped;
                return;
            }
        };
        let frame = match &self.context.correction{
            Some(correction) => correction.correct(&frame),
            None => frame,
        };

        match self.state{
            LoopState::Initializing | LoopState::Tracking(TrackingPhase::Reseeding) =>{
                self.seed(&frame);
            }
            LoopState::Tracking(TrackingPhase::Steady) => self.track(&frame),
            LoopState::Idle | LoopState::WaitingForConnection | LoopState::Stopped => {}
        }
        self.previous = Some(frame);

        self.flush_telemetry();
        self.rate.tick();
    }

    fn seed(&mut self, frame: &GrayImage){
        let count = self.features.initialize(frame).len();
        if count == 0{
            tracing::debug!("no corners found, retrying next frame");
            return;
        }

        if self.state == LoopState::Initializing{
            tracing::info!("tracking {} features", count);
            self.encoder.begin_path();
        }
        self.state = LoopState::Tracking(TrackingPhase::Steady);
    }

    fn track(&mut self, frame: &GrayImage){
        let previous = match &self.previous{
            Some(previous) => previous,
            None =>{
                self.summary.reseeds += 1;
                if self.features.initialize(frame).is_empty(){
                    self.state = LoopState::Tracking(TrackingPhase::Reseeding);
                }
                tracing::debug!("no previous frame, re-seeded {} features", self.features.len());
                return;
            }
        };

        let flow = self.estimator.track(previous, frame, self.features.features());
        match flow.displacement{
            Some(displacement) =>{
                if let Some(position) = self.integrator.integrate(&displacement){
                    self.encoder.append(&position);
                    self.summary.samples += 1;
                }
            }
            None =>{
                self.summary.tracking_failures += 1;
                tracing::debug!("{}", PipelineError::TrackingFailure);
            }
        }

        if self.features.update(frame, &flow) == UpdateOutcome::Reseeded{
            self.summary.reseeds += 1;
            tracing::debug!(
                "re-seeded: {}/{} tracked, {} new features",
                flow.tracked_count(),
                flow.fed_count(),
                self.features.len()
            );
            if self.features.is_empty(){
                self.state = LoopState::Tracking(TrackingPhase::Reseeding);
            }
        }
    }

    fn recenter(&mut self){
        let origin = self.integrator.recenter();
        self.encoder.begin_path();
        tracing::info!("recentered at ({}, {})", origin.x, origin.y);
    }

    //held chunk goes first so the peer sees bytes in append order
    fn flush_telemetry(&mut self){
        let chunk = match self.held.take(){
            Some(chunk) => Some(chunk),
            None => self.encoder.emit_chunk(),
        };
        let chunk = match chunk{
            Some(chunk) => chunk,
            None => return,
        };

        match self.context.channel.publish(chunk){
            Ok(()) => self.summary.chunks_published += 1,
            Err(PipelineError::ChannelDisconnected(chunk)) =>{
                tracing::debug!("no peer, holding {} byte chunk", chunk.len());
                self.held = Some(chunk);
            }
            Err(err) => tracing::warn!("publish failed: {}", err),
        }
    }

    fn stop(&mut self){
        self.state = LoopState::Stopped;
        self.context.camera.release();
        self.context.channel.shutdown();
        tracing::info!(
            cycles = self.summary.cycles,
            samples = self.summary.samples,
            reseeds = self.summary.reseeds,
            chunks = self.summary.chunks_published,
            "capture stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use image::Luma;
    use nalgebra::Vector2;

    use crate::channel::{LinkEvent, MemoryLink};
    use crate::config::GateMode;
    use crate::error::CaptureError;
    use crate::input::{NoInput, ScriptedCommands};

    struct ScriptedCamera {
        frames: VecDeque<std::result::Result<GrayImage, CaptureError>>,
        released: Arc<Mutex<bool>>,
    }

    impl ScriptedCamera {
        fn new(frames: Vec<std::result::Result<GrayImage, CaptureError>>) -> (Self, Arc<Mutex<bool>>) {
            let released = Arc::new(Mutex::new(false));
            let camera = ScriptedCamera {
                frames: frames.into(),
                released: released.clone(),
            };
            (camera, released)
        }
    }

    impl Camera for ScriptedCamera {
        fn capture(&mut self) -> std::result::Result<GrayImage, CaptureError> {
            self.frames.pop_front().unwrap_or(Err(CaptureError::Closed))
        }

        fn release(&mut self) {
            *self.released.lock().unwrap() = true;
        }

        fn dimensions(&self) -> (u32, u32) {
            (640, 480)
        }
    }

    /// Bright squares on a dark background.
    fn scene() -> GrayImage {
        let mut image = GrayImage::from_pixel(640, 480, Luma([30]));
        for oy in (60..420).step_by(100) {
            for ox in (60..580).step_by(100) {
                for y in oy..oy + 40 {
                    for x in ox..ox + 40 {
                        image.put_pixel(x, y, Luma([220]));
                    }
                }
            }
        }
        image
    }

    fn frames(n: usize) -> Vec<std::result::Result<GrayImage, CaptureError>> {
        (0..n).map(|_| Ok(scene())).collect()
    }

    fn build(
        camera: ScriptedCamera,
        link: &MemoryLink,
        input: Box<dyn CommandSource>,
    ) -> CaptureLoop {
        let context = PipelineContext::new(Box::new(camera), Box::new(link.clone()), input);
        CaptureLoop::new(context, &TrackerConfig::default())
    }

    fn stream(samples: usize) -> Vec<u8> {
        let mut bytes = b"M ".to_vec();
        for _ in 0..samples {
            bytes.extend_from_slice(b"106,80 ");
        }
        bytes
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_frames_stream_centre_position() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, released) = ScriptedCamera::new(frames(8));
        let mut capture = build(camera, &link, Box::new(NoInput));
        let (_tx, rx) = watch::channel(false);

        let summary = capture.run(rx).await.unwrap();

        assert_eq!(capture.state(), LoopState::Stopped);
        assert_eq!(capture.position(), Point2::new(320.0, 240.0));
        assert_eq!(summary.cycles, 9);
        assert_eq!(summary.samples, 7);
        assert_eq!(summary.chunks_published, 2);

        let sent: Vec<u8> = link.notified().concat();
        assert!(link.notified().iter().all(|c| c.len() == 20));
        assert_eq!(&sent[..], &stream(7)[..40]);
        assert!(*released.lock().unwrap());
        assert!(link.is_shut_down());
    }

    #[test]
    fn test_disconnected_chunk_is_held_then_sent_first() {
        let link = MemoryLink::new();
        let (camera, _) = ScriptedCamera::new(frames(6));
        let mut capture = build(camera, &link, Box::new(NoInput));
        capture.state = LoopState::Initializing;

        for _ in 0..5 {
            capture.step();
        }
        // "M " + 4 samples = 30 bytes: one chunk cut and held
        assert!(link.notified().is_empty());
        assert_eq!(capture.held.as_ref().map(|c| c.len()), Some(20));
        assert_eq!(capture.summary().chunks_published, 0);

        link.push_event(LinkEvent::Connected);
        capture.step();

        assert_eq!(link.notified(), vec![stream(5)[..20].to_vec()]);
        assert!(capture.held.is_none());
    }

    #[test]
    fn test_recenter_command_resets_and_marks_path() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, _) = ScriptedCamera::new(frames(3));
        let commands = ScriptedCommands::new([None, Some(LocalCommand::Recenter)]);
        let mut capture = build(camera, &link, Box::new(commands));
        capture.state = LoopState::Initializing;
        capture.integrator = PositionIntegrator::new(
            640,
            480,
            StabilityGate {
                epsilon: 0.01,
                mode: GateMode::Moving,
            },
        );

        capture.step();
        capture.integrator.integrate(&Vector2::new(12.0, -4.0));
        assert_eq!(capture.position(), Point2::new(332.0, 236.0));

        capture.step();
        assert_eq!(capture.position(), Point2::new(320.0, 240.0));
        assert_eq!(capture.state(), LoopState::Tracking(TrackingPhase::Steady));
        assert!(capture.encoder.pending().ends_with(b"M "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_command_stops_and_releases() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, released) = ScriptedCamera::new(frames(10));
        let commands = ScriptedCommands::new([None, None, Some(LocalCommand::Exit)]);
        let mut capture = build(camera, &link, Box::new(commands));
        let (_tx, rx) = watch::channel(false);

        let summary = capture.run(rx).await.unwrap();

        assert_eq!(summary.cycles, 3);
        assert_eq!(capture.state(), LoopState::Stopped);
        assert!(*released.lock().unwrap());
        assert!(link.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_while_waiting_for_peer() {
        let link = MemoryLink::new();
        let (camera, released) = ScriptedCamera::new(frames(1));
        let mut capture = build(camera, &link, Box::new(NoInput));
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            let _ = tx.send(true);
        });

        let summary = capture.run(rx).await.unwrap();
        assert_eq!(summary.cycles, 0);
        assert_eq!(capture.state(), LoopState::Stopped);
        assert!(*released.lock().unwrap());
    }

    #[test]
    fn test_recoverable_capture_failure_is_skipped() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, _) = ScriptedCamera::new(vec![
            Ok(scene()),
            Err(CaptureError::NoFrame("timeout".into())),
            Ok(scene()),
            Ok(scene()),
        ]);
        let mut capture = build(camera, &link, Box::new(NoInput));
        capture.state = LoopState::Initializing;

        capture.step();
        capture.step();
        assert_eq!(capture.state(), LoopState::Tracking(TrackingPhase::Steady));
        assert_eq!(capture.summary().skipped_frames, 1);
        assert!(capture.previous.is_none());

        // no motion across the gap: the frame after it only re-seeds
        capture.step();
        assert_eq!(capture.summary().samples, 0);
        assert_eq!(capture.summary().reseeds, 1);
        assert!(!capture.features.is_empty());
        assert!(capture.previous.is_some());

        capture.step();
        assert_eq!(capture.summary().samples, 1);
        capture.step();
        assert_eq!(capture.state(), LoopState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_key_while_waiting_for_peer() {
        let link = MemoryLink::new();
        let (camera, released) = ScriptedCamera::new(frames(1));
        let commands = ScriptedCommands::new([None, Some(LocalCommand::Recenter), Some(LocalCommand::Exit)]);
        let mut capture = build(camera, &link, Box::new(commands));
        let (_tx, rx) = watch::channel(false);

        let summary = capture.run(rx).await.unwrap();

        assert_eq!(summary.cycles, 0);
        assert_eq!(capture.state(), LoopState::Stopped);
        assert!(*released.lock().unwrap());
        assert!(link.is_shut_down());
        assert!(link.notified().is_empty());
    }

    #[test]
    fn test_scene_loss_reseeds_until_corners_return() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let blank = GrayImage::from_pixel(640, 480, Luma([0]));
        let (camera, _) = ScriptedCamera::new(vec![
            Ok(scene()),
            Ok(blank.clone()),
            Ok(blank),
            Ok(scene()),
            Ok(scene()),
        ]);
        let mut capture = build(camera, &link, Box::new(NoInput));
        capture.state = LoopState::Initializing;

        let mut states = Vec::new();
        for _ in 0..5 {
            capture.step();
            states.push(capture.state());
        }

        let steady = LoopState::Tracking(TrackingPhase::Steady);
        let reseeding = LoopState::Tracking(TrackingPhase::Reseeding);
        assert_eq!(states, vec![steady, reseeding, reseeding, steady, steady]);
        assert_eq!(capture.summary().reseeds, 1);
        assert!(!capture.features.is_empty());
        // only the first seed opens a path
        assert_eq!(capture.encoder.pending().iter().filter(|&&b| b == b'M').count(), 1);
    }

    #[test]
    fn test_featureless_previous_frame_is_tracking_failure() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, _) = ScriptedCamera::new(frames(2));
        let mut capture = build(camera, &link, Box::new(NoInput));
        capture.state = LoopState::Initializing;

        capture.step();
        capture.previous = Some(GrayImage::from_pixel(640, 480, Luma([0])));
        capture.step();

        let summary = capture.summary();
        assert_eq!(summary.tracking_failures, 1);
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.reseeds, 1);
        assert_eq!(capture.state(), LoopState::Tracking(TrackingPhase::Steady));
        assert_eq!(capture.position(), Point2::new(320.0, 240.0));
    }

    #[test]
    fn test_reconnect_mid_stream_sends_held_chunk_first() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, _) = ScriptedCamera::new(frames(10));
        let mut capture = build(camera, &link, Box::new(NoInput));
        capture.state = LoopState::Initializing;

        for _ in 0..4 {
            capture.step();
        }
        // "M " + 3 samples = 23 bytes
        assert_eq!(link.notified().len(), 1);
        assert_eq!(capture.summary().chunks_published, 1);

        link.push_event(LinkEvent::Disconnected);
        for _ in 0..4 {
            capture.step();
        }
        assert_eq!(link.notified().len(), 1);
        assert_eq!(capture.held.as_ref().map(|c| c.len()), Some(20));

        link.push_event(LinkEvent::Connected);
        capture.step();
        assert_eq!(link.notified().len(), 2);
        assert!(capture.held.is_none());
        capture.step();

        let summary = capture.summary();
        assert_eq!(summary.samples, 9);
        assert_eq!(summary.chunks_published, 3);
        assert_eq!(capture.state(), LoopState::Tracking(TrackingPhase::Steady));

        let sent = link.notified();
        assert!(sent.iter().all(|c| c.len() == 20));
        assert_eq!(sent.concat(), stream(9)[..60].to_vec());
    }

    #[test]
    fn test_blank_frames_stay_initializing() {
        let link = MemoryLink::new();
        let blank = GrayImage::from_pixel(640, 480, Luma([0]));
        let (camera, _) = ScriptedCamera::new(vec![Ok(blank.clone()), Ok(blank), Ok(scene())]);
        let mut capture = build(camera, &link, Box::new(NoInput));
        capture.state = LoopState::Initializing;

        capture.step();
        capture.step();
        assert_eq!(capture.state(), LoopState::Initializing);
        capture.step();
        assert_eq!(capture.state(), LoopState::Tracking(TrackingPhase::Steady));
    }

    #[test]
    fn test_peer_write_recenter_handler() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, _) = ScriptedCamera::new(frames(2));
        let mut capture = build(camera, &link, Box::new(NoInput))
            .with_write_handler(Box::new(RecenterOnWrite));
        capture.state = LoopState::Initializing;
        capture.integrator = PositionIntegrator::new(
            640,
            480,
            StabilityGate {
                epsilon: 0.01,
                mode: GateMode::Moving,
            },
        );
        capture.step();
        capture.integrator.integrate(&Vector2::new(50.0, 50.0));

        link.push_event(LinkEvent::WriteRequest(Vec::new()));
        capture.step();

        assert_eq!(capture.position(), Point2::new(320.0, 240.0));
    }

    #[test]
    fn test_peer_write_ignored_by_default() {
        let link = MemoryLink::new();
        link.push_event(LinkEvent::Connected);
        let (camera, _) = ScriptedCamera::new(frames(2));
        let mut capture = build(camera, &link, Box::new(NoInput));
        capture.state = LoopState::Initializing;
        capture.step();
        capture.integrator = PositionIntegrator::new(
            640,
            480,
            StabilityGate {
                epsilon: 0.01,
                mode: GateMode::Moving,
            },
        );
        capture.integrator.integrate(&Vector2::new(50.0, 50.0));

        link.push_event(LinkEvent::WriteRequest(b"ping".to_vec()));
        capture.step();

        assert_eq!(capture.position(), Point2::new(370.0, 290.0));
        assert_eq!(capture.context.channel.on_read(), b"ping".to_vec());
    }
}
