//! Remote avatar smoothing on the client.

use glam::Vec3;

/// Linear blend of the remote avatar toward the last host-reported position.
///
/// Each retarget restarts the blend from wherever the avatar is drawn at
/// that moment. Once the window has elapsed the target is returned exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteInterpolation {
    window: f32,
    start: Vec3,
    target: Option<Vec3>,
    elapsed: f32,
}

impl RemoteInterpolation {
    /// Create an idle interpolator blending over `window` seconds.
    pub fn new(window: f32) -> Self {
        Self {
            window: window.max(0.0),
            start: Vec3::ZERO,
            target: None,
            elapsed: 0.0,
        }
    }

    /// Start a new blend from `current` to `target`.
    pub fn retarget(&mut self, current: Vec3, target: Vec3) {
        self.start = current;
        self.target = Some(target);
        self.elapsed = 0.0;
    }

    /// Blend fraction in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.window <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.window).clamp(0.0, 1.0)
    }

    /// Position at the current point of the blend, or `None` before the
    /// first target.
    pub fn position(&self) -> Option<Vec3> {
        let target = self.target?;
        let t = self.progress();
        if t >= 1.0 {
            Some(target)
        } else {
            Some(self.start.lerp(target, t))
        }
    }

    /// Advance by `dt` seconds and return the new position.
    pub fn advance(&mut self, dt: f32) -> Option<Vec3> {
        self.target?;
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.window);
        self.position()
    }

    /// Whether a blend is still in progress.
    pub fn is_blending(&self) -> bool {
        self.target.is_some() && self.progress() < 1.0
    }

    /// Last target received.
    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    /// Drop the current target.
    pub fn reset(&mut self) {
        self.target = None;
        self.elapsed = 0.0;
    }
}
