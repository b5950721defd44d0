pub mod explain;
pub mod health;
pub mod landing;
