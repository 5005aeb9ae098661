pub mod hexdump;
mod read_ext;

pub use self::hexdump::hexdump;
pub(crate) use self::read_ext::ReadExt;
