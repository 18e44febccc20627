use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a decoded image, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for ImageSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_size_serialization() {
        let size = ImageSize::new(200, 100);
        let json = serde_json::to_string(&size).unwrap();
        assert_eq!(json, r#"{"width":200,"height":100}"#);
        let restored: ImageSize = serde_json::from_str(&json).unwrap();
        assert_eq!(size, restored);
        assert_eq!(size.to_string(), "200x100");
    }
}
