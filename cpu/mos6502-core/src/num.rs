pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;
}

macro_rules! impl_get_bit {
    ($t:ty) => {
        impl GetBit for $t {
            #[inline]
            fn bit(self, i: u8) -> bool {
                debug_assert!(i < (<$t>::BITS as u8));
                self & (1 << i) != 0
            }
        }
    };
}

impl_get_bit!(u8);
impl_get_bit!(u16);

pub trait U16Ext {
    fn lsb(self) -> u8;

    fn msb(self) -> u8;
}

impl U16Ext for u16 {
    #[inline(always)]
    fn lsb(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    fn msb(self) -> u8 {
        (self >> 8) as u8
    }
}

/// Whether two addresses live on different 256-byte pages.
#[inline]
#[must_use]
pub fn page_crossed(from: u16, to: u16) -> bool {
    from.msb() != to.msb()
}

/// Sign-extend an 8-bit branch displacement to 16 bits.
#[inline]
#[must_use]
pub fn sign_extend(offset: u8) -> u16 {
    if offset.bit(7) { 0xFF00 | u16::from(offset) } else { u16::from(offset) }
}
