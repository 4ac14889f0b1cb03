pub use ::tokio_util::codec as tokio_codec;

mod line;

pub use self::line::*;
