pub mod image_url;

pub use image_url::ImageUrlNormalizer;
