use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use winit::dpi::{PhysicalPosition, PhysicalSize};

mod sealed {
    pub trait Sealed {}
}

/// Primitive integer types usable as `Vector2` components.
pub trait Integral: sealed::Sealed + Copy + Default + PartialEq + Eq + std::fmt::Debug {}

macro_rules! impl_integral {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}
            impl Integral for $t {}
        )*
    };
}

impl_integral!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// An ordered pair of integers. Used for cursor positions, offsets and window sizes.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector2<T: Integral> {
    pub x: T,
    pub y: T,
}

impl<T: Integral> Vector2<T> {
    pub const fn new(x: T, y: T) -> Self {
        Vector2 { x, y }
    }
}

impl<T: Integral + Add<Output = T>> Add for Vector2<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Integral + Sub<Output = T>> Sub for Vector2<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Integral + AddAssign> AddAssign for Vector2<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T: Integral + SubAssign> SubAssign for Vector2<T> {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<T: Integral + Neg<Output = T>> Neg for Vector2<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Vector2::new(-self.x, -self.y)
    }
}

impl<T: Integral> From<(T, T)> for Vector2<T> {
    fn from((x, y): (T, T)) -> Self {
        Vector2::new(x, y)
    }
}

impl<T: Integral> From<Vector2<T>> for (T, T) {
    fn from(v: Vector2<T>) -> Self {
        (v.x, v.y)
    }
}

impl From<PhysicalPosition<i32>> for Vector2<i32> {
    fn from(p: PhysicalPosition<i32>) -> Self {
        Vector2::new(p.x, p.y)
    }
}

impl From<Vector2<i32>> for PhysicalPosition<i32> {
    fn from(v: Vector2<i32>) -> Self {
        PhysicalPosition::new(v.x, v.y)
    }
}

impl From<PhysicalSize<u32>> for Vector2<u32> {
    fn from(s: PhysicalSize<u32>) -> Self {
        Vector2::new(s.width, s.height)
    }
}

impl From<Vector2<u32>> for PhysicalSize<u32> {
    fn from(v: Vector2<u32>) -> Self {
        PhysicalSize::new(v.x, v.y)
    }
}
