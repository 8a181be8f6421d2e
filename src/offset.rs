use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::Error;
use crate::write::FileStore;

/// An unsigned file offset of fixed width, stored little-endian.
///
/// The maximum representable value is reserved as the null sentinel and
/// never refers to stored data; the leading magic byte keeps real
/// offsets nonzero, so neither end of the range can collide.
pub trait Offset: Copy + Eq {
    /// Serialised width in bytes.
    const WIDTH: usize;
    /// The distinguished "absent" value.
    const NULL: Self;

    fn to_u64(self) -> u64;
    fn from_u64(value: u64) -> Self;

    /// Checked conversion of a computed file position; the sentinel value
    /// itself does not fit.
    fn from_offset(offset: u64) -> Result<Self, Error> {
        if offset >= Self::NULL.to_u64() {
            return Err(Error::OffsetOverflow {
                offset,
                width: Self::WIDTH,
            });
        }
        Ok(Self::from_u64(offset))
    }

    /// Little-endian read of the first `WIDTH` bytes of `buf`.
    fn read_from(buf: &[u8]) -> Self {
        let mut value = 0u64;
        for (i, &b) in buf[..Self::WIDTH].iter().enumerate() {
            value |= u64::from(b) << (i * 8);
        }
        Self::from_u64(value)
    }

    /// Little-endian append of `WIDTH` bytes.
    fn append_to(self, out: &mut FileStore) -> Result<(), Error> {
        out.append(&self.to_u64().to_le_bytes()[..Self::WIDTH])?;
        Ok(())
    }

    #[inline]
    fn is_null(self) -> bool {
        self == Self::NULL
    }
}

macro_rules! impl_offset {
    ($($ty:ty),*) => {$(
        impl Offset for $ty {
            const WIDTH: usize = size_of::<$ty>();
            const NULL: Self = <$ty>::MAX;

            #[inline]
            fn to_u64(self) -> u64 {
                u64::from(self)
            }

            #[inline]
            fn from_u64(value: u64) -> Self {
                value as $ty
            }
        }
    )*};
}

impl_offset!(u8, u16, u32, u64);

/// Serialised offset width in bytes; smaller widths shrink the file but
/// cap its total size.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum OffsetWidth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

#[test]
fn test_from_offset_overflow() {
    assert_eq!(0xfffe, <u16 as Offset>::from_offset(0xfffe).unwrap());
    assert!(matches!(
        <u16 as Offset>::from_offset(0xffff),
        Err(Error::OffsetOverflow { offset: 0xffff, width: 2 })
    ));
    assert!(matches!(
        <u16 as Offset>::from_offset(0x10000),
        Err(Error::OffsetOverflow { .. })
    ));
    assert!(<u8 as Offset>::from_offset(0xff).is_err());
    assert!(<u64 as Offset>::from_offset(u64::MAX).is_err());
}

#[test]
fn test_read_le() {
    assert_eq!(0x0201, <u16 as Offset>::read_from(&[0x01, 0x02, 0x03]));
    assert_eq!(0x04030201, <u32 as Offset>::read_from(&[0x01, 0x02, 0x03, 0x04]));
    assert!(<u32 as Offset>::read_from(&[0xff; 4]).is_null());
}

#[test]
fn test_width_from_primitive() {
    assert_eq!(OffsetWidth::Four, OffsetWidth::try_from(4u8).unwrap());
    assert!(OffsetWidth::try_from(3u8).is_err());
    assert_eq!(2u8, OffsetWidth::Two.into());
}
