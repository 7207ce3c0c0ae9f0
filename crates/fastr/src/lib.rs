#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use fastr_image as image;

#[doc(inline)]
pub use fastr_imgproc as imgproc;
