//! The gesture state machine.
//!
//! One session tracks one input stream from its first touch-down to
//! resolution or cancellation; a session never outlives its gesture and at
//! most one is active at a time. State transitions:
//!
//! `Idle -> Tracking(session) -> Idle` (resolved or cancelled)
//!
//! Classification rules:
//! * Cumulative displacement of the primary pointer beyond `touch_slop`
//!   commits the session to scrolling; exactly-slop movement stays inside
//!   the tap region.
//! * An uncommitted single-pointer release resolves to double-tap (within
//!   the double-tap timeout and slop of the previous tap), long-press (held
//!   past the long-press timeout), or tap.
//! * A committed release resolves to a fast-scroll when the final move
//!   segment's velocity clears the configured threshold.
//! * Two pointers moving the same direction on an axis fast-scroll along
//!   the dominant axis; otherwise their span ratio is a scale step.
//!
//! Scroll deltas are reported in content coordinates (negated pointer
//! movement): dragging the finger up scrolls the content down.

use tracing::{debug, trace};

use core_model::PointF;

use crate::{Clock, EventKind, Gesture, GestureEvent, TouchConfig};

/// In-flight pointer-tracking state between a touch-down and resolution.
#[derive(Debug, Clone)]
struct Session {
    start_points: Vec<PointF>,
    start_time_ms: i64,
    last_points: Vec<PointF>,
    last_move_time_ms: i64,
    /// Velocity (px/s) of the most recent move segment.
    last_velocity: f32,
    /// Deltas of the most recent move segment, already negated.
    last_scroll: (f32, f32),
    /// Set once displacement leaves the tap region; never unset.
    committed_to_scroll: bool,
    /// Set when a second pointer ever joined; disqualifies tap outcomes.
    saw_multi_touch: bool,
    /// Inter-pointer distance at the previous two-pointer sample.
    last_span: f32,
}

impl Session {
    fn begin(points: Vec<PointF>, now_ms: i64) -> Self {
        Self {
            start_points: points.clone(),
            start_time_ms: now_ms,
            last_points: points,
            last_move_time_ms: now_ms,
            last_velocity: 0.0,
            last_scroll: (0.0, 0.0),
            committed_to_scroll: false,
            saw_multi_touch: false,
            last_span: 0.0,
        }
    }

    fn primary_start(&self) -> PointF {
        self.start_points.first().copied().unwrap_or_default()
    }

    fn primary_last(&self) -> PointF {
        self.last_points.first().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Tracking(Session),
}

/// A just-resolved tap, kept across sessions for double-tap pairing.
#[derive(Debug, Clone, Copy)]
struct TapMemory {
    point: PointF,
    time_ms: i64,
}

/// Classifies raw pointer samples into [`Gesture`] values.
pub struct GestureRecognizer<C: Clock> {
    config: TouchConfig,
    clock: C,
    state: State,
    last_tap: Option<TapMemory>,
}

impl<C: Clock> GestureRecognizer<C> {
    pub fn new(config: TouchConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            state: State::Idle,
            last_tap: None,
        }
    }

    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    /// Feed one raw sample; returns exactly one classification (possibly
    /// `Undefined` for non-terminal samples).
    pub fn handle_event(&mut self, event: &GestureEvent) -> Gesture {
        let now_ms = self.clock.now_ms();
        if event.points.is_empty() && event.kind != EventKind::TouchCancel {
            trace!(target: "gesture.fsm", kind = ?event.kind, "sample_without_points");
            return Gesture::Undefined;
        }
        match event.kind {
            EventKind::MouseDown => self.on_mouse_down(event.points[0], now_ms),
            EventKind::TouchDown => self.on_touch_down(event.points.clone(), now_ms),
            EventKind::TouchPointerDown => self.on_pointer_down(event.points.clone()),
            EventKind::TouchPointerUp => self.on_pointer_up(event.points.clone()),
            EventKind::TouchMove => self.on_move(&event.points, now_ms),
            EventKind::TouchUp => self.on_touch_up(now_ms),
            EventKind::TouchCancel => self.on_cancel(),
        }
    }

    /// Mouse clicks skip session tracking: the platform already debounced
    /// press/release, so a down is a resolved tap or double-tap.
    fn on_mouse_down(&mut self, point: PointF, now_ms: i64) -> Gesture {
        self.state = State::Idle;
        if self.is_double_tap(point, now_ms) {
            self.last_tap = None;
            debug!(target: "gesture.fsm", "mouse_double_tap");
            Gesture::DoubleTap { point }
        } else {
            self.last_tap = Some(TapMemory {
                point,
                time_ms: now_ms,
            });
            Gesture::Tap { point }
        }
    }

    fn on_touch_down(&mut self, points: Vec<PointF>, now_ms: i64) -> Gesture {
        if matches!(self.state, State::Tracking(_)) {
            debug!(target: "gesture.fsm", "touch_down_while_tracking_restarts_session");
        }
        self.state = State::Tracking(Session::begin(points, now_ms));
        Gesture::Undefined
    }

    fn on_pointer_down(&mut self, points: Vec<PointF>) -> Gesture {
        if let State::Tracking(session) = &mut self.state {
            session.saw_multi_touch = true;
            if points.len() >= 2 {
                session.last_span = points[0].distance(&points[1]);
            }
            session.start_points = points.clone();
            session.last_points = points;
        }
        Gesture::Undefined
    }

    fn on_pointer_up(&mut self, points: Vec<PointF>) -> Gesture {
        if let State::Tracking(session) = &mut self.state {
            session.saw_multi_touch = true;
            session.start_points = points.clone();
            session.last_points = points;
        }
        Gesture::Undefined
    }

    fn on_move(&mut self, points: &[PointF], now_ms: i64) -> Gesture {
        let State::Tracking(session) = &mut self.state else {
            return Gesture::Undefined;
        };
        if points.len() >= 2 && session.last_points.len() >= 2 {
            return Self::on_multi_pointer_move(session, points);
        }

        let current = points[0];
        if !session.committed_to_scroll {
            let displacement = current.distance(&session.primary_start());
            // The tap region is closed: exactly touch_slop still taps.
            if displacement > self.config.touch_slop {
                session.committed_to_scroll = true;
                trace!(
                    target: "gesture.fsm",
                    displacement,
                    slop = self.config.touch_slop,
                    "committed_to_scroll"
                );
            }
        }
        if !session.committed_to_scroll {
            session.last_points = vec![current];
            session.last_move_time_ms = now_ms;
            return Gesture::Undefined;
        }

        let previous = session.primary_last();
        let dx = current.x - previous.x;
        let dy = current.y - previous.y;
        let dt_ms = (now_ms - session.last_move_time_ms).max(1);
        session.last_velocity = current.distance(&previous) / dt_ms as f32 * 1000.0;
        session.last_scroll = (-dx, -dy);
        session.last_points = vec![current];
        session.last_move_time_ms = now_ms;
        Gesture::Scroll { dx: -dx, dy: -dy }
    }

    /// Two tracked pointers: same-direction travel is a two-finger fling on
    /// the dominant axis; opposed travel is a pinch step reported as the
    /// ratio of the current span to the previous one.
    fn on_multi_pointer_move(session: &mut Session, points: &[PointF]) -> Gesture {
        session.saw_multi_touch = true;
        let (start0, start1) = (session.start_points[0], session.start_points[1]);
        let (curr0, curr1) = (points[0], points[1]);
        let (dx0, dy0) = (curr0.x - start0.x, curr0.y - start0.y);
        let (dx1, dy1) = (curr1.x - start1.x, curr1.y - start1.y);

        let x_same_direction = (dx0 > 0.0 && dx1 > 0.0) || (dx0 < 0.0 && dx1 < 0.0);
        let y_same_direction = (dy0 > 0.0 && dy1 > 0.0) || (dy0 < 0.0 && dy1 < 0.0);
        let result = if x_same_direction || y_same_direction {
            // A two-finger fling travels along one axis only.
            let max_dx = dx0.max(dx1);
            let max_dy = dy0.max(dy1);
            if max_dx.abs() > max_dy.abs() {
                Gesture::FastScroll {
                    dx: -max_dx,
                    dy: 0.0,
                }
            } else {
                Gesture::FastScroll {
                    dx: 0.0,
                    dy: -max_dy,
                }
            }
        } else {
            let span = curr0.distance(&curr1);
            let factor = if session.last_span > 0.0 {
                span / session.last_span
            } else {
                1.0
            };
            session.last_span = span;
            Gesture::Scale { factor }
        };
        session.last_points = points.to_vec();
        result
    }

    fn on_touch_up(&mut self, now_ms: i64) -> Gesture {
        let State::Tracking(session) = std::mem::replace(&mut self.state, State::Idle) else {
            return Gesture::Undefined;
        };
        if session.committed_to_scroll {
            let (dx, dy) = session.last_scroll;
            if session.last_velocity >= self.config.fast_scroll_min_velocity {
                debug!(
                    target: "gesture.fsm",
                    velocity = session.last_velocity,
                    "fling_release"
                );
                return Gesture::FastScroll { dx, dy };
            }
            return Gesture::Undefined;
        }
        if session.saw_multi_touch {
            return Gesture::Undefined;
        }

        let point = session.primary_last();
        if self.is_double_tap(point, now_ms) {
            self.last_tap = None;
            return Gesture::DoubleTap { point };
        }
        if now_ms - session.start_time_ms > self.config.long_press_timeout_ms {
            return Gesture::LongPress { point };
        }
        self.last_tap = Some(TapMemory {
            point,
            time_ms: now_ms,
        });
        Gesture::Tap { point }
    }

    fn on_cancel(&mut self) -> Gesture {
        if matches!(self.state, State::Tracking(_)) {
            trace!(target: "gesture.fsm", "session_cancelled");
        }
        self.state = State::Idle;
        Gesture::Undefined
    }

    /// Within the double-tap timeout and slop of the previous resolved tap.
    /// Uses the same closed-region slop policy as scroll commitment.
    fn is_double_tap(&self, point: PointF, now_ms: i64) -> bool {
        self.last_tap.is_some_and(|tap| {
            now_ms - tap.time_ms <= self.config.double_tap_timeout_ms
                && point.distance(&tap.point) <= self.config.touch_slop
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonotonicClock;

    #[test]
    fn idle_stream_ignores_moves_and_ups() {
        let mut rec = GestureRecognizer::new(TouchConfig::default(), MonotonicClock::new());
        let mv = GestureEvent::new(EventKind::TouchMove, vec![PointF::new(5.0, 5.0)]);
        assert_eq!(rec.handle_event(&mv), Gesture::Undefined);
        let up = GestureEvent::new(EventKind::TouchUp, vec![PointF::new(5.0, 5.0)]);
        assert_eq!(rec.handle_event(&up), Gesture::Undefined);
    }

    #[test]
    fn empty_sample_is_undefined() {
        let mut rec = GestureRecognizer::new(TouchConfig::default(), MonotonicClock::new());
        let ev = GestureEvent::new(EventKind::TouchDown, vec![]);
        assert_eq!(rec.handle_event(&ev), Gesture::Undefined);
    }
}
