//! Periodic re-tick trigger
//!
//! A check fires `delay` after the previous one. Viewer updates only refresh
//! the position a check reads, so a viewer that never stops moving still
//! streams. When a check fires, the world ticks only if the viewer has moved
//! more than one chunk width on x or z since the previous tick.

use std::time::Duration;

use glam::Vec3;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::render::sink::RenderSink;
use crate::world::streamer::World;

#[derive(Clone, Debug)]
pub struct TickScheduler {
    delay: Duration,
    threshold: f32,
    last_tick: Option<Vec3>,
    deadline: Option<Instant>,
}

impl TickScheduler {
    pub fn new(delay: Duration, chunk_width: i32) -> Self {
        TickScheduler {
            delay,
            threshold: chunk_width as f32,
            last_tick: None,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn last_tick(&self) -> Option<Vec3> {
        self.last_tick
    }

    /// Schedules the next check, replacing any pending one.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn record_tick(&mut self, viewer: Vec3) {
        self.last_tick = Some(viewer);
    }

    /// True before the first tick or once the viewer is more than one chunk
    /// width away on either horizontal axis.
    pub fn has_moved(&self, viewer: Vec3) -> bool {
        match self.last_tick {
            None => true,
            Some(last) => {
                (viewer.x - last.x).abs() > self.threshold
                    || (viewer.z - last.z).abs() > self.threshold
            }
        }
    }

    /// Runs the pending check if it is due. Re-arms after every check and
    /// returns whether the caller should tick now.
    pub fn poll(&mut self, now: Instant, viewer: Vec3) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return false,
        }
        self.arm(now);
        if self.has_moved(viewer) {
            self.record_tick(viewer);
            true
        } else {
            false
        }
    }
}

/// Ticks `world` for the initial viewer position, then keeps it streaming
/// until the sender side of `viewer` is dropped. Returns the number of ticks.
pub async fn drive<S: RenderSink>(
    world: &mut World<S>,
    mut viewer: watch::Receiver<Vec3>,
    delay: Duration,
) -> u64 {
    let mut scheduler = TickScheduler::new(delay, world.chunk_width());
    let mut ticks = 0;

    let start = *viewer.borrow_and_update();
    scheduler.record_tick(start);
    world.tick(start);
    ticks += 1;
    scheduler.arm(Instant::now());

    loop {
        let Some(deadline) = scheduler.deadline() else {
            break;
        };
        tokio::select! {
            changed = viewer.changed() => {
                if changed.is_err() {
                    break;
                }
                // Picked up by the next check; the deadline stays put.
            }
            _ = tokio::time::sleep_until(deadline) => {
                let position = *viewer.borrow();
                if scheduler.poll(Instant::now(), position) {
                    world.tick(position);
                    ticks += 1;
                }
            }
        }
    }

    tracing::info!("Viewer feed closed after {} ticks", ticks);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    use crate::render::sink::RecordingSink;
    use crate::utils::settings::WorldSettings;

    const DELAY: Duration = Duration::from_millis(1000);

    #[test]
    fn test_poll_waits_for_deadline() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(DELAY, 16);
        assert!(!scheduler.poll(start, Vec3::ZERO));

        scheduler.arm(start);
        assert!(!scheduler.poll(start + Duration::from_millis(999), Vec3::ZERO));
        assert!(scheduler.poll(start + DELAY, Vec3::ZERO));
        assert_eq!(scheduler.deadline(), Some(start + DELAY * 2));
    }

    #[test]
    fn test_small_moves_do_not_tick() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(DELAY, 16);
        scheduler.record_tick(Vec3::ZERO);
        scheduler.arm(start);

        assert!(!scheduler.poll(start + DELAY, Vec3::new(16.0, 0.0, -16.0)));
        assert!(scheduler.poll(start + DELAY * 2, Vec3::new(16.5, 0.0, 0.0)));
        assert_eq!(scheduler.last_tick(), Some(Vec3::new(16.5, 0.0, 0.0)));
        // Vertical movement never matters.
        assert!(!scheduler.poll(start + DELAY * 3, Vec3::new(16.5, 500.0, 0.0)));
    }

    #[test]
    fn test_rearm_replaces_pending_check() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(DELAY, 16);
        scheduler.arm(start);
        scheduler.arm(start + Duration::from_millis(600));
        assert!(!scheduler.poll(start + DELAY, Vec3::ZERO));
        assert!(scheduler.poll(start + Duration::from_millis(1600), Vec3::ZERO));

        scheduler.cancel();
        assert!(!scheduler.poll(start + DELAY * 10, Vec3::new(100.0, 0.0, 0.0)));
    }

    fn small_world() -> World<RecordingSink> {
        let settings = WorldSettings {
            chunk_width: 8,
            chunk_height: 24,
            render_radius: 1,
            water_level: 6,
            ..WorldSettings::default()
        };
        World::new(settings, RecordingSink::new()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_ticks_after_movement() {
        let mut world = small_world();
        let (tx, rx) = watch::channel(Vec3::ZERO);

        let feed = async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            tx.send(Vec3::new(100.0, 0.0, 0.0)).unwrap();
            tokio::time::sleep(Duration::from_millis(3000)).await;
            drop(tx);
        };

        let (ticks, ()) = tokio::join!(drive(&mut world, rx, DELAY), feed);
        assert_eq!(ticks, 2);
        assert_eq!(world.tick_count(), 2);
        assert_eq!(world.last_viewer(), Some(Vec3::new(100.0, 0.0, 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewer_updates_do_not_postpone_checks() {
        let mut world = small_world();
        let (tx, rx) = watch::channel(Vec3::ZERO);

        let feed = async move {
            // Updates every 300ms, faster than the check delay.
            for step in 1..=6 {
                tokio::time::sleep(Duration::from_millis(300)).await;
                tx.send(Vec3::new(step as f32 * 50.0, 0.0, 0.0)).unwrap();
            }
            drop(tx);
        };

        let (ticks, ()) = tokio::join!(drive(&mut world, rx, DELAY), feed);
        // The check at 1000ms sees the 900ms position.
        assert_eq!(ticks, 2);
        assert_eq!(world.last_viewer(), Some(Vec3::new(150.0, 0.0, 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_walk_keeps_streaming() {
        let mut world = small_world();
        let (tx, rx) = watch::channel(Vec3::ZERO);

        let feed = async move {
            // 10 units every 100ms, offset so sends never land on a check.
            tokio::time::sleep(Duration::from_millis(50)).await;
            for step in 1..=100 {
                tx.send(Vec3::new(step as f32 * 10.0, 0.0, 0.0)).unwrap();
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            drop(tx);
        };

        let (ticks, ()) = tokio::join!(drive(&mut world, rx, DELAY), feed);
        // One initial tick plus one per check at 1s..=10s.
        assert_eq!(ticks, 11);
        assert_eq!(world.last_viewer(), Some(Vec3::new(1000.0, 0.0, 0.0)));
        assert!(world.chunk(IVec3::new(1000, 0, 0)).is_some());
    }
}
