//! Axis-aligned box edge tests.

use glam::Vec3;

/// Extents of a box relative to its object's position.
///
/// `top`/`bottom` are Y offsets, `right`/`left` X offsets and `depth` the
/// half extent along Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hitbox {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
    pub depth: f32,
}

impl Hitbox {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32, depth: f32) -> Self {
        Self { top, right, bottom, left, depth }
    }

    /// `[top, right, bottom, left, depth]`
    pub fn from_array([top, right, bottom, left, depth]: [f32; 5]) -> Self {
        Self::new(top, right, bottom, left, depth)
    }

    pub fn to_array(self) -> [f32; 5] {
        [self.top, self.right, self.bottom, self.left, self.depth]
    }
}

/// Edge of a box that collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// World-space edges of a positioned hitbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
    pub front: f32,
    pub back: f32,
}

impl Bounds {
    pub fn new(position: Vec3, hitbox: &Hitbox) -> Self {
        Self {
            top: hitbox.top + position.y,
            right: hitbox.right + position.x,
            bottom: hitbox.bottom + position.y,
            left: hitbox.left + position.x,
            front: position.z - hitbox.depth,
            back: position.z + hitbox.depth,
        }
    }

    /// One of our X edges lies strictly inside `other`'s X range.
    pub fn overlaps_x(&self, other: &Bounds) -> bool {
        (self.right > other.left && self.right < other.right)
            || (self.left < other.right && self.left > other.left)
    }

    /// One of our Y edges lies strictly inside `other`'s Y range.
    pub fn overlaps_y(&self, other: &Bounds) -> bool {
        (self.bottom < other.top && self.bottom > other.bottom)
            || (self.top > other.bottom && self.top < other.top)
    }

    /// No area in the X/Y plane.
    pub fn is_degenerate(&self) -> bool {
        self.right <= self.left || self.top <= self.bottom
    }

    pub fn overlaps_z(&self, other: &Bounds) -> bool {
        (self.back > other.front && self.back < other.back)
            || (self.front < other.back && self.front > other.front)
    }
}

/// At most one horizontal and one vertical colliding edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeHits {
    pub horizontal: Option<Edge>,
    pub vertical: Option<Edge>,
}

impl EdgeHits {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_none() && self.vertical.is_none()
    }
}

/// Which edges of `a` penetrate `b`.
///
/// An edge counts only when it lies strictly inside `b` along its own axis,
/// the other axis overlaps, and the depth ranges overlap. Identical or
/// zero-size boxes produce no hits. When both edges of an axis qualify the
/// later check wins (bottom over top, right over left).
pub fn intersects_rect(a: &Bounds, b: &Bounds) -> EdgeHits {
    let horizontal = a.overlaps_x(b);
    let vertical = a.overlaps_y(b);
    let depth = a.overlaps_z(b);

    let mut hits = EdgeHits::default();
    if !depth || a.is_degenerate() || b.is_degenerate() {
        return hits;
    }

    if a.top > b.bottom && a.top < b.top && horizontal {
        hits.vertical = Some(Edge::Top);
    }
    if a.bottom < b.top && a.bottom > b.bottom && horizontal {
        hits.vertical = Some(Edge::Bottom);
    }
    if a.left > b.left && a.left < b.right && vertical {
        hits.horizontal = Some(Edge::Left);
    }
    if a.right > b.left && a.right < b.right && vertical {
        hits.horizontal = Some(Edge::Right);
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Hitbox {
        Hitbox::from_array([1.0, 1.0, -1.0, -1.0, 1.0])
    }

    fn floor() -> Bounds {
        Bounds::new(Vec3::ZERO, &Hitbox::from_array([1.0, 10.0, -1.0, -10.0, 2.0]))
    }

    #[test]
    fn bounds_offset_by_position() {
        let b = Bounds::new(Vec3::new(2.0, 3.0, 4.0), &unit());
        assert_eq!(b.top, 4.0);
        assert_eq!(b.bottom, 2.0);
        assert_eq!(b.left, 1.0);
        assert_eq!(b.right, 3.0);
        assert_eq!(b.front, 3.0);
        assert_eq!(b.back, 5.0);
    }

    #[test]
    fn landing_box_reports_bottom() {
        let falling = Bounds::new(Vec3::new(0.0, 1.75, 0.0), &unit());
        let hits = intersects_rect(&falling, &floor());
        assert_eq!(hits.vertical, Some(Edge::Bottom));
    }

    #[test]
    fn head_bump_reports_top() {
        let below = Bounds::new(Vec3::new(0.0, -1.75, 0.0), &unit());
        let hits = intersects_rect(&below, &floor());
        assert_eq!(hits.vertical, Some(Edge::Top));
    }

    #[test]
    fn side_contact_reports_right() {
        let wall = Bounds::new(Vec3::new(3.0, 0.0, 0.0), &Hitbox::from_array([2.0, 1.0, -2.0, -1.0, 2.0]));
        let mover = Bounds::new(Vec3::new(1.5, 0.0, 0.0), &unit());
        let hits = intersects_rect(&mover, &wall);
        assert_eq!(hits.horizontal, Some(Edge::Right));
    }

    #[test]
    fn separated_depth_means_no_hits() {
        let falling = Bounds::new(Vec3::new(0.0, 1.75, 5.0), &unit());
        assert!(intersects_rect(&falling, &floor()).is_empty());
    }

    #[test]
    fn coincident_boxes_produce_nothing() {
        let a = Bounds::new(Vec3::ZERO, &unit());
        assert!(intersects_rect(&a, &a).is_empty());
    }

    #[test]
    fn zero_size_hitbox_produces_nothing() {
        let point = Bounds::new(Vec3::new(0.0, 0.5, 0.0), &Hitbox::default());
        assert!(intersects_rect(&point, &floor()).is_empty());
        assert!(intersects_rect(&floor(), &point).is_empty());
    }

    #[test]
    fn hitbox_array_roundtrip() {
        let arr = [1.0, 2.0, -3.0, -4.0, 5.0];
        assert_eq!(Hitbox::from_array(arr).to_array(), arr);
    }
}
