use std::time::Duration;

use glam::Vec3;
use viewport_kernel::{Task, TaskError};

use crate::object::ObjectId;
use crate::scene::Scene;

/// Transform component driven by an [`Animation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedProperty {
    Position,
    Rotation,
    Origin,
    Scale,
}

/// Linear keyframe animation of one property of one object.
///
/// Runs as a scheduler task; keyframes are spread evenly over `duration`.
#[derive(Debug, Clone)]
pub struct Animation {
    target: ObjectId,
    property: AnimatedProperty,
    keyframes: Vec<Vec3>,
    pub duration: Duration,
    pub looping: bool,
    time: Duration,
    playing: bool,
}

impl Animation {
    pub fn new(target: ObjectId, property: AnimatedProperty) -> Self {
        Self {
            target,
            property,
            keyframes: Vec::new(),
            duration: Duration::from_millis(1000),
            looping: false,
            time: Duration::ZERO,
            playing: false,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn looped(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn with_keyframes(mut self, keyframes: impl IntoIterator<Item = Vec3>) -> Self {
        self.keyframes.extend(keyframes);
        self
    }

    pub fn push_keyframe(&mut self, value: Vec3) {
        self.keyframes.push(value);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn reset(&mut self) {
        self.time = Duration::ZERO;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Interpolated value at `time`, or `None` without keyframes.
    pub fn sample(&self, time: Duration) -> Option<Vec3> {
        let (first, last) = (self.keyframes.first()?, self.keyframes.last()?);
        let count = self.keyframes.len();
        if count == 1 || self.duration.is_zero() {
            return Some(*first);
        }
        if time >= self.duration {
            return Some(*last);
        }
        let frame_time = self.duration.as_secs_f32() / (count - 1) as f32;
        let position = time.as_secs_f32() / frame_time;
        let index = (position.floor() as usize).min(count - 1);
        let next = (index + 1).min(count - 1);
        let progress = position - index as f32;
        Some(self.keyframes[index].lerp(self.keyframes[next], progress))
    }

    fn apply(&self, scene: &mut Scene, value: Vec3) -> Result<(), TaskError> {
        let object = scene
            .get_mut(self.target)
            .ok_or_else(|| TaskError::MissingTarget(format!("{:?}", self.target)))?;
        let transform = &mut object.transform;
        match self.property {
            AnimatedProperty::Position => transform.position = value,
            AnimatedProperty::Rotation => transform.rotation = value,
            AnimatedProperty::Origin => transform.origin = value,
            AnimatedProperty::Scale => transform.scale = value,
        }
        Ok(())
    }
}

impl Task<Scene> for Animation {
    fn execute(&mut self, scene: &mut Scene, dt: Duration) -> Result<bool, TaskError> {
        self.playing = true;
        self.time += dt;

        if self.time >= self.duration {
            self.reset();
            if !self.looping {
                self.stop();
                if let Some(&last) = self.keyframes.last() {
                    self.apply(scene, last)?;
                }
            }
        } else if let Some(value) = self.sample(self.time) {
            self.apply(scene, value)?;
        }
        Ok(!self.playing)
    }

    fn name(&self) -> &str {
        "animation"
    }
}

#[cfg(test)]
mod tests {
    use viewport_kernel::Scheduler;

    use super::*;
    use crate::object::SceneObject;

    fn scene_with_object() -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        let id = scene.add(SceneObject::new("geometry"));
        (scene, id)
    }

    #[test]
    fn interpolates_between_keyframes() {
        let (mut scene, id) = scene_with_object();
        let mut animation = Animation::new(id, AnimatedProperty::Position)
            .with_keyframes([Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 0.0)]);

        assert_eq!(animation.execute(&mut scene, Duration::from_millis(250)), Ok(false));
        assert_eq!(scene.get(id).map(|o| o.transform.position), Some(Vec3::new(5.0, 0.0, 0.0)));

        assert_eq!(animation.execute(&mut scene, Duration::from_millis(500)), Ok(false));
        assert_eq!(scene.get(id).map(|o| o.transform.position), Some(Vec3::new(10.0, 5.0, 0.0)));
    }

    #[test]
    fn finishes_on_last_keyframe() {
        let (mut scene, id) = scene_with_object();
        let mut scheduler: Scheduler<Scene> = Scheduler::new();
        scheduler.add_task(
            Animation::new(id, AnimatedProperty::Scale)
                .with_duration(Duration::from_millis(100))
                .with_keyframes([Vec3::ONE, Vec3::splat(3.0)]),
        );

        for _ in 0..20 {
            assert!(scheduler.run(&mut scene, Duration::from_millis(8)).is_ok());
        }
        assert!(scheduler.is_empty());
        assert_eq!(scene.get(id).map(|o| o.transform.scale), Some(Vec3::splat(3.0)));
    }

    #[test]
    fn looping_never_finishes() {
        let (mut scene, id) = scene_with_object();
        let mut animation = Animation::new(id, AnimatedProperty::Rotation)
            .with_duration(Duration::from_millis(16))
            .looped()
            .with_keyframes([Vec3::ZERO, Vec3::Y]);
        for _ in 0..10 {
            assert_eq!(animation.execute(&mut scene, Duration::from_millis(8)), Ok(false));
        }
        assert!(animation.is_playing());
    }

    #[test]
    fn missing_target_fails() {
        let (mut scene, id) = scene_with_object();
        assert!(scene.remove(id).is_ok());
        let mut animation = Animation::new(id, AnimatedProperty::Origin).with_keyframes([Vec3::ZERO, Vec3::ONE]);
        let result = animation.execute(&mut scene, Duration::from_millis(8));
        assert!(matches!(result, Err(TaskError::MissingTarget(_))));
    }
}
