use serde::{
    Deserialize,
    Serialize
};

pub type Vector2F = Vector2X<f32>;
pub type Vector2I = Vector2X<i32>;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vector2X<T> {
    pub x: T,
    pub y: T,
}

pub type Rect2F = Rect2X<f32>;
pub type Rect2I = Rect2X<i32>;

/// Axis-aligned rectangle, `pos` is the top-left corner.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rect2X<T> {
    pub pos: Vector2X<T>,
    pub size: Vector2X<T>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl<T: std::fmt::Display> std::fmt::Display for Vector2X<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Rect2X<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[({},{}), ({},{})]", self.pos.x, self.pos.y, self.size.x, self.size.y)
    }
}

impl Axis {
    pub fn orthogonal(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

impl<T> Vector2X<T>
where
    T: Default
{
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: T::default(), y: T::default() }
    }
}

impl<T> Vector2X<T>
where
    T: Into<f32> + Copy
{
    pub fn length_squared(&self) -> f32 {
        let xf: f32 = T::into(self.x);
        let yf: f32 = T::into(self.y);
        xf.powi(2) + yf.powi(2)
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector, zero vector stays zero.
    pub fn normal(&self) -> Vector2X<f32> {
        let len = self.length();
        if len == 0.0 {
            return Vector2X { x: 0.0, y: 0.0 };
        }
        Vector2X {
            x: T::into(self.x) / len,
            y: T::into(self.y) / len,
        }
    }
}

impl Vector2X<f32>
{
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };

    pub fn dot(&self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(&self, rhs: Self) -> f32 {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Component-wise product.
    pub fn hadamard(&self, rhs: Self) -> Self {
        Self { x: self.x * rhs.x, y: self.y * rhs.y }
    }

    /// Component-wise quotient.
    pub fn hadamard_div(&self, rhs: Self) -> Self {
        Self { x: self.x / rhs.x, y: self.y / rhs.y }
    }

    pub fn abs(&self) -> Self {
        Self { x: self.x.abs(), y: self.y.abs() }
    }

    pub fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }

    pub fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    pub fn set_along(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::Horizontal => self.x = value,
            Axis::Vertical => self.y = value,
        }
    }
}

/// Linear interpolation from `a` to `b`, `t = 0` gives `a`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// -1, 0 or 1. Unlike `f32::signum` zero maps to zero.
pub fn sign(value: f32) -> f32 {
    if value == 0.0 {
        0.0
    } else if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

impl<T> std::ops::Add for Vector2X<T>
where
    T: std::ops::Add<Output = T>
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y
        }

    }
}

impl<T> std::ops::AddAssign for Vector2X<T>
where
    T: std::ops::AddAssign
{
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T> std::ops::SubAssign for Vector2X<T>
where
    T: std::ops::SubAssign
{
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<T> std::ops::Neg for Vector2X<T>
where
    T: std::ops::Neg<Output = T>
{
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self {
            x: T::neg(self.x),
            y: T::neg(self.y),
        }
    }
}

impl<T> std::ops::Mul<T> for Vector2X<T>
where
    T: std::ops::Mul<Output = T> + Copy
{
    type Output = Self;
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs
        }
    }
}

impl<T> std::ops::Div<T> for Vector2X<T>
where
    T: std::ops::Div<Output = T> + Copy
{
    type Output = Self;
    fn div(self, rhs: T) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs
        }
    }
}

impl<T> std::ops::Sub for Vector2X<T>
where
    T: std::ops::Sub<Output = T>
{
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: T::sub(self.x, rhs.x),
            y: T::sub(self.y, rhs.y)
        }
    }
}

impl From<Vector2X<f32>> for Vector2X<i32> {
    fn from(value: Vector2X<f32>) -> Self {
        Self { x: value.x as i32, y: value.y as i32 }
    }
}

impl From<Vector2X<i32>> for Vector2X<f32> {
    fn from(value: Vector2X<i32>) -> Self {
        Self { x: value.x as f32, y: value.y as f32 }
    }
}

impl<T> Rect2X<T> {
    pub fn new(x: T, y: T, w: T, h: T) -> Self {
        Self { pos: Vector2X { x, y }, size: Vector2X { x: w, y: h } }
    }
}

impl<T> Rect2X<T>
where
    T: PartialOrd + std::ops::Add<Output = T> + Copy
{
    /// Half-open containment, the right and bottom edges are outside.
    pub fn contains(&self, point: &Vector2X<T>) -> bool {
        point.x >= self.pos.x
            && point.y >= self.pos.y
            && point.x < self.pos.x + self.size.x
            && point.y < self.pos.y + self.size.y
    }

    /// Closed containment, points on any edge are inside.
    pub fn contains_inclusive(&self, point: &Vector2X<T>) -> bool {
        point.x >= self.pos.x
            && point.y >= self.pos.y
            && point.x <= self.pos.x + self.size.x
            && point.y <= self.pos.y + self.size.y
    }

    /// Top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Vector2X<T>; 4] {
        let Rect2X { pos, size } = *self;
        [
            pos,
            Vector2X { x: pos.x + size.x, y: pos.y },
            Vector2X { x: pos.x + size.x, y: pos.y + size.y },
            Vector2X { x: pos.x, y: pos.y + size.y },
        ]
    }
}

impl Rect2X<f32> {
    /// Rectangle of `size` centered on `center`.
    pub fn from_center(center: Vector2F, size: Vector2F) -> Self {
        Self { pos: center - size / 2.0, size }
    }

    pub fn center(&self) -> Vector2F {
        self.pos + self.size / 2.0
    }

    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }
}

#[test]
fn test_vector_creation() {
    let v1 = Vector2X::<f32>::new(1.0, 2.0);
    assert_eq!(v1.x, 1.0);
    assert_eq!(v1.y, 2.0);
}

#[test]
fn test_vector_add() {
    let v1 = Vector2X::<i32>::new(1, 2);
    let v2 = Vector2X::<i32>::new(10, 20);
    let v3 = v1 + v2;
    assert_eq!(v3.x, v1.x + v2.x);
    assert_eq!(v3.y, v1.y + v2.y);
}

#[test]
fn test_vector_add_sub_assign() {
    let v1 = Vector2X::<i32>::new(1, 2);
    let mut v2 = Vector2X::<i32>::new(10, 20);
    v2 += v1;
    assert_eq!(v2, Vector2I::new(11, 22));
    v2 -= v1;
    assert_eq!(v2, Vector2I::new(10, 20));
}

#[test]
fn test_vector_negation() {
    let v1 = Vector2X::<i32>::new(1, 2);
    let v1_neg = -v1;
    assert_eq!(v1_neg.x, -v1.x);
    assert_eq!(v1_neg.y, -v1.y);
}

#[test]
fn test_vector_mul_div_scalar() {
    let v1 = Vector2F::new(1.0, 2.0);
    assert_eq!(v1 * 5.0, Vector2F::new(5.0, 10.0));
    assert_eq!(v1 / 2.0, Vector2F::new(0.5, 1.0));
}

#[test]
fn test_vector_casting() {
    let v1 = Vector2X::<f32>::new(1.2, 2.6);
    let v1_cast_i32 =  Vector2X::<i32>::from(v1);
    assert_eq!(v1_cast_i32.x, 1);
    assert_eq!(v1_cast_i32.y, 2);
}

#[test]
fn test_vector_dot_cross() {
    let v1 = Vector2X::<f32>::new(1.0, 0.0);
    let v2 = Vector2X::<f32>::new(-1.0, 0.0);
    assert_eq!(v1.dot(v2), -1.0);

    let up = Vector2F::new(0.0, 1.0);
    assert_eq!(v1.cross(up), 1.0);
    assert_eq!(up.cross(v1), -1.0);
}

#[test]
fn test_vector_hadamard() {
    let v1 = Vector2F::new(2.0, 3.0);
    let v2 = Vector2F::new(4.0, 6.0);
    assert_eq!(v1.hadamard(v2), Vector2F::new(8.0, 18.0));
    assert_eq!(v2.hadamard_div(v1), Vector2F::new(2.0, 2.0));
}

#[test]
fn test_vector_normal_of_zero_is_zero() {
    assert_eq!(Vector2F::ZERO.normal(), Vector2F::ZERO);
    assert_eq!(Vector2F::new(3.0, 4.0).normal(), Vector2F::new(0.6, 0.8));
}

#[test]
fn test_lerp_and_sign() {
    assert_eq!(lerp(10.0, 20.0, 0.0), 10.0);
    assert_eq!(lerp(10.0, 20.0, 1.0), 20.0);
    assert_eq!(lerp(10.0, 20.0, 0.25), 12.5);
    assert_eq!(Vector2F::ZERO.lerp(Vector2F::new(4.0, -8.0), 0.5), Vector2F::new(2.0, -4.0));

    assert_eq!(sign(-3.0), -1.0);
    assert_eq!(sign(0.0), 0.0);
    assert_eq!(sign(0.5), 1.0);
}

#[test]
fn test_vector_axis_access() {
    let mut v = Vector2F::new(1.0, 2.0);
    assert_eq!(v.along(Axis::Horizontal), 1.0);
    assert_eq!(v.along(Axis::Vertical), 2.0);
    v.set_along(Axis::Vertical, 7.0);
    assert_eq!(v, Vector2F::new(1.0, 7.0));
    assert_eq!(Axis::Vertical.orthogonal(), Axis::Horizontal);
}

#[test]
fn test_rect_creation() {
    let position = Vector2X::<f32>::new(1.0, 0.0);
    let size = Vector2X::<f32>::new(3.0, 5.0);
    let rect = Rect2X::new(position.x, position.y, size.x, size.y);
    assert_eq!(rect.pos, position);
    assert_eq!(rect.size, size);
    assert_eq!(rect.area(), 15.0);
}

#[test]
fn test_rect_from_center() {
    let rect = Rect2F::from_center(Vector2F::new(10.0, 10.0), Vector2F::new(4.0, 2.0));
    assert_eq!(rect, Rect2F::new(8.0, 9.0, 4.0, 2.0));
    assert_eq!(rect.center(), Vector2F::new(10.0, 10.0));
}

#[test]
fn test_rect_containing() {
    let position = Vector2X::<f32>::new(1.0, 0.0);
    let size = Vector2X::<f32>::new(3.0, 5.0);
    let rect = Rect2X::new(position.x, position.y, size.x, size.y);

    let p1_inside = position;
    let p2_not_inside = position + Vector2X::new(size.x, 0.0);
    let p3_not_inside = position + Vector2X::new(0.0, size.y);
    let p4_not_inside = position + size;
    let p5_inside = position + Vector2X::new(size.x / 2.0, size.y / 2.0);

    assert!(rect.contains(&p1_inside));
    assert!(!rect.contains(&p2_not_inside));
    assert!(!rect.contains(&p3_not_inside));
    assert!(!rect.contains(&p4_not_inside));
    assert!(rect.contains(&p5_inside));

    assert!(rect.contains_inclusive(&p2_not_inside));
    assert!(rect.contains_inclusive(&p4_not_inside));
    assert!(!rect.contains_inclusive(&(p4_not_inside + Vector2F::new(0.01, 0.0))));
}

#[test]
fn test_rect_corners_order() {
    let rect = Rect2F::new(0.0, 0.0, 2.0, 1.0);
    assert_eq!(rect.corners(), [
        Vector2F::new(0.0, 0.0),
        Vector2F::new(2.0, 0.0),
        Vector2F::new(2.0, 1.0),
        Vector2F::new(0.0, 1.0),
    ]);
}
