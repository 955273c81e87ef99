use std::ops;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Vector2D {
    pub x: i32,
    pub y: i32,
}

impl Vector2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether `other` lies at least `threshold` away on either axis.
    pub fn is_beyond(&self, other: Self, threshold: i32) -> bool {
        (self.x - other.x).abs() >= threshold || (self.y - other.y).abs() >= threshold
    }
}

impl From<(i16, i16)> for Vector2D {
    fn from((x, y): (i16, i16)) -> Self {
        Self::new(x.into(), y.into())
    }
}

impl ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector2d_add() {
        let v1 = Vector2D::new(1, 2);
        let v2 = Vector2D::new(3, 4);
        assert_eq!(v1 + v2, Vector2D::new(4, 6));
    }

    #[test]
    fn test_vector2d_sub() {
        let v1 = Vector2D::new(1, 2);
        let v2 = Vector2D::new(3, 4);
        assert_eq!(v1 - v2, Vector2D::new(-2, -2));
    }

    #[test]
    fn test_vector2d_from_event_coordinates() {
        assert_eq!(Vector2D::from((-3i16, 7i16)), Vector2D::new(-3, 7));
    }

    #[test]
    fn test_vector2d_is_beyond() {
        let origin = Vector2D::new(10, 10);

        assert!(!origin.is_beyond(Vector2D::new(14, 6), 5));
        assert!(origin.is_beyond(Vector2D::new(15, 10), 5));
        assert!(origin.is_beyond(Vector2D::new(10, 5), 5));
    }
}
