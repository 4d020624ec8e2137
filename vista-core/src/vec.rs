/// Three- and four-component float vectors
use approx::AbsDiffEq;
use std::fmt;
use std::ops;

use crate::error::MathError;

/// Per-component tolerance used by vector and matrix equality
pub const EPSILON: f32 = 1e-5;

macro_rules! vec_op_impl {
    ($trait: ident, $func: ident, $v: ident, $($e: ident),*) => {
        impl ops::$trait<$v> for $v {
            type Output = $v;

            #[inline]
            fn $func(self, rhs: $v) -> $v {
                $v { $( $e: ops::$trait::$func(self.$e, rhs.$e), )* }
            }
        }
    };
}

macro_rules! vec_assign_op_impl {
    ($trait: ident, $func: ident, $v: ident, $($e: ident),*) => {
        impl ops::$trait<$v> for $v {
            #[inline]
            fn $func(&mut self, rhs: $v) {
                $( ops::$trait::$func(&mut self.$e, rhs.$e); )*
            }
        }
    };
}

macro_rules! scalar_op_impl {
    ($trait: ident, $func: ident, $v: ident, $($e: ident),*) => {
        impl ops::$trait<f32> for $v {
            type Output = $v;

            #[inline]
            fn $func(self, rhs: f32) -> $v {
                $v { $( $e: ops::$trait::$func(self.$e, rhs), )* }
            }
        }
    };
}

macro_rules! scalar_assign_op_impl {
    ($trait: ident, $func: ident, $v: ident, $($e: ident),*) => {
        impl ops::$trait<f32> for $v {
            #[inline]
            fn $func(&mut self, rhs: f32) {
                $( ops::$trait::$func(&mut self.$e, rhs); )*
            }
        }
    };
}

macro_rules! vec_impl {
    ($v: ident, $n: expr, $($e: ident),*) => {
        #[derive(Debug, Default, Copy, Clone)]
        pub struct $v {
            $( pub $e: f32, )*
        }

        impl $v {
            #[inline]
            pub const fn new($( $e: f32, )*) -> $v {
                $v { $( $e, )* }
            }

            #[inline]
            pub const fn zero() -> $v {
                $v { $( $e: 0.0, )* }
            }

            /// Every component set to `value`
            #[inline]
            pub const fn splat(value: f32) -> $v {
                $v { $( $e: value, )* }
            }

            #[inline]
            pub fn set(&mut self, $( $e: f32, )*) {
                $( self.$e = $e; )*
            }

            #[inline]
            pub fn negate(&mut self) {
                $( self.$e = -self.$e; )*
            }

            #[inline]
            pub fn dot(&self, rhs: &$v) -> f32 {
                0.0 $( + self.$e * rhs.$e )*
            }

            #[inline]
            pub fn length(&self) -> f32 {
                self.dot(self).sqrt()
            }

            /// Scale to unit length in place.
            pub fn normalize(&mut self) -> Result<(), MathError> {
                let length = self.length();
                if length == 0.0 || !length.is_finite() {
                    return Err(MathError::DegenerateVector);
                }
                $( self.$e /= length; )*
                Ok(())
            }

            pub fn normalized(&self) -> Result<$v, MathError> {
                let mut v = *self;
                v.normalize()?;
                Ok(v)
            }

            #[inline]
            pub fn to_array(&self) -> [f32; $n] {
                [$( self.$e, )*]
            }
        }

        impl From<[f32; $n]> for $v {
            fn from(a: [f32; $n]) -> $v {
                let [$( $e, )*] = a;
                $v { $( $e, )* }
            }
        }

        impl fmt::Display for $v {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                $( write!(f, "{:>10.2}", self.$e)?; )*
                Ok(())
            }
        }

        impl PartialEq for $v {
            fn eq(&self, other: &$v) -> bool {
                true $( && (self.$e - other.$e).abs() < EPSILON )*
            }
        }

        impl AbsDiffEq for $v {
            type Epsilon = f32;

            fn default_epsilon() -> f32 {
                EPSILON
            }

            fn abs_diff_eq(&self, other: &$v, epsilon: f32) -> bool {
                true $( && self.$e.abs_diff_eq(&other.$e, epsilon) )*
            }
        }

        impl ops::Neg for $v {
            type Output = $v;

            #[inline]
            fn neg(self) -> $v {
                $v { $( $e: -self.$e, )* }
            }
        }

        impl ops::Mul<$v> for f32 {
            type Output = $v;

            #[inline]
            fn mul(self, rhs: $v) -> $v {
                rhs * self
            }
        }

        vec_op_impl!(Add, add, $v, $($e),*);
        vec_op_impl!(Sub, sub, $v, $($e),*);
        vec_assign_op_impl!(AddAssign, add_assign, $v, $($e),*);
        vec_assign_op_impl!(SubAssign, sub_assign, $v, $($e),*);
        scalar_op_impl!(Mul, mul, $v, $($e),*);
        scalar_op_impl!(Div, div, $v, $($e),*);
        scalar_assign_op_impl!(MulAssign, mul_assign, $v, $($e),*);
        scalar_assign_op_impl!(DivAssign, div_assign, $v, $($e),*);
    };
}

vec_impl!(Vec3, 3, x, y, z);
vec_impl!(Vec4, 4, x, y, z, w);

// Component-wise product is only meaningful for homogeneous columns.
vec_op_impl!(Mul, mul, Vec4, x, y, z, w);
vec_assign_op_impl!(MulAssign, mul_assign, Vec4, x, y, z, w);

impl Vec3 {
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    /// Right-handed cross product
    #[inline]
    pub fn cross(&self, b: &Vec3) -> Vec3 {
        Vec3 {
            x: self.y * b.z - self.z * b.y,
            y: self.z * b.x - self.x * b.z,
            z: self.x * b.y - self.y * b.x,
        }
    }

    /// Angle to `other` in radians.
    pub fn angle_between(&self, other: &Vec3) -> Result<f32, MathError> {
        let lengths = self.length() * other.length();
        if lengths == 0.0 || !lengths.is_finite() {
            return Err(MathError::DegenerateVector);
        }
        Ok((self.dot(other) / lengths).clamp(-1.0, 1.0).acos())
    }

    /// Homogeneous extension with the given `w`
    #[inline]
    pub fn extend(&self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Vec4 {
    #[inline]
    pub fn truncate(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_constructors() {
        assert_eq!(Vec3::zero(), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(Vec3::splat(2.5), Vec3::new(2.5, 2.5, 2.5));
        assert_eq!(Vec4::default(), Vec4::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(Vec3::from([1.0, 2.0, 3.0]), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_set_and_negate() {
        let mut v = Vec3::zero();
        v.set(1.0, -2.0, 3.0);
        v.negate();
        assert_eq!(v, Vec3::new(-1.0, 2.0, -3.0));
        assert_eq!(-v, Vec3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(2.0 * a, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b / 2.0, Vec3::new(2.0, 2.5, 3.0));

        let mut c = a;
        c += b;
        c -= Vec3::splat(1.0);
        c *= 2.0;
        c /= 4.0;
        assert_eq!(c, Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_dot_cross_length() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(&b) - 32.0).abs() < 1e-6);
        assert_eq!(a.cross(&b), Vec3::new(-3.0, 6.0, -3.0));
        assert_eq!(Vec3::X.cross(&Vec3::Y), Vec3::Z);
        assert!((Vec3::new(3.0, 4.0, 0.0).length() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_keeps_direction() {
        let v = Vec3::new(3.0, -4.0, 12.0);
        let n = v.normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.dot(&v) - v.length()).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_zero_is_error() {
        let mut v = Vec3::zero();
        assert_eq!(v.normalize(), Err(MathError::DegenerateVector));
        assert_eq!(Vec4::zero().normalized(), Err(MathError::DegenerateVector));
    }

    #[test]
    fn test_angle_between() {
        assert_abs_diff_eq!(Vec3::X.angle_between(&Vec3::Y).unwrap(), FRAC_PI_2);
        assert_abs_diff_eq!(Vec3::X.angle_between(&(Vec3::X * 5.0)).unwrap(), 0.0);
        assert_eq!(
            Vec3::zero().angle_between(&Vec3::X),
            Err(MathError::DegenerateVector)
        );
    }

    #[test]
    fn test_vec4_elementwise() {
        let a = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4::new(2.0, 0.5, -1.0, 0.0);
        assert_eq!(a * b, Vec4::new(2.0, 1.0, -3.0, 0.0));
        assert!((a.dot(&b) - 0.0).abs() < 1e-6);
        assert_eq!(Vec3::new(1.0, 2.0, 3.0).extend(1.0).truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_tolerance_equality() {
        let a = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(a, Vec3::new(1.000_001, 1.0, 0.999_999));
        assert_ne!(a, Vec3::new(1.001, 1.0, 1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Vec3::new(1.0, -2.5, 31415.0)), "      1.00     -2.50  31415.00");
        assert_eq!(
            format!("{}", Vec4::new(0.0, 0.0, 0.0, 1.0)),
            "      0.00      0.00      0.00      1.00"
        );
    }
}
