//! Request extractors whose rejections go through `AppError`.

mod json;

pub use json::JsonBody;
