use glam::{Vec3, Vec4};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Aggregate value used to detect that nothing relevant changed.
///
/// Two fingerprints are equal only when every hashed component had the same
/// bit pattern (modulo 64-bit hash collisions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

/// Incremental FNV-1a builder for [`Fingerprint`].
#[derive(Debug, Clone, Copy)]
pub struct FingerprintBuilder {
    state: u64,
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    fn mix(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u64(mut self, value: u64) -> Self {
        self.mix(&value.to_le_bytes());
        self
    }

    pub fn write_f32(mut self, value: f32) -> Self {
        self.mix(&value.to_bits().to_le_bytes());
        self
    }

    pub fn write_vec3(self, v: Vec3) -> Self {
        self.write_f32(v.x).write_f32(v.y).write_f32(v.z)
    }

    pub fn write_vec4(self, v: Vec4) -> Self {
        self.write_f32(v.x)
            .write_f32(v.y)
            .write_f32(v.z)
            .write_f32(v.w)
    }

    pub fn write_fingerprint(self, other: Option<Fingerprint>) -> Self {
        match other {
            Some(fp) => self.write_u64(1).write_u64(fp.0),
            None => self.write_u64(0),
        }
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_inputs_equal_fingerprints() {
        let a = FingerprintBuilder::new().write_vec3(Vec3::new(1.0, 2.0, 3.0)).finish();
        let b = FingerprintBuilder::new().write_vec3(Vec3::new(1.0, 2.0, 3.0)).finish();
        assert_eq!(a, b);
    }

    #[test]
    fn permuted_components_differ() {
        // A component sum would treat these as equal.
        let a = FingerprintBuilder::new().write_vec3(Vec3::new(1.0, 2.0, 3.0)).finish();
        let b = FingerprintBuilder::new().write_vec3(Vec3::new(3.0, 2.0, 1.0)).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn signed_zero_is_observed() {
        let a = FingerprintBuilder::new().write_f32(0.0).finish();
        let b = FingerprintBuilder::new().write_f32(-0.0).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn parent_presence_changes_result() {
        let base = FingerprintBuilder::new().write_u64(7);
        assert_ne!(
            base.write_fingerprint(None).finish(),
            base.write_fingerprint(Some(Fingerprint(0))).finish()
        );
    }
}
