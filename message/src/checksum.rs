pub trait Checksum {
    type Output: Copy + Eq + std::fmt::Display;

    fn checksum(vals: &[u8]) -> Self::Output;

    #[inline]
    fn verify(vals: &[u8], expected: Self::Output) -> bool {
        Self::checksum(vals) == expected
    }
}

#[macro_export]
macro_rules! impl_checksum {
    ($vis:vis $name:ident, $ty:ty, $algo:expr) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        $vis struct $name;

        impl $crate::checksum::Checksum for $name {
            type Output = $ty;

            #[inline]
            fn checksum(vals: &[u8]) -> Self::Output {
                const INSTANCE: ::crc::Crc<$ty> = ::crc::Crc::<$ty>::new(&$algo);

                INSTANCE.checksum(vals)
            }
        }
    };
}

// zlib / binascii.crc32 compatible
impl_checksum!(pub PayloadCrc, u32, ::crc::CRC_32_ISO_HDLC);
