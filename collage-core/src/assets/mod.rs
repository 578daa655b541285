pub mod background;
pub mod collection;
pub mod decode;
pub mod preview;
pub mod text;
