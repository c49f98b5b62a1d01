//! Endian swaps and width-specialised byte-region primitives.
//!
//! Region operations move whole 8-byte chunks first and then finish the 0-7
//! byte remainder with a fixed set of 1/2/4-byte accesses, overlapping inside
//! the remainder where the width is odd (5 bytes = two 4-byte accesses at
//! offsets 0 and 1). The decomposition is deterministic on every target so
//! structure comparisons are bit-exact.

/// Reverses the byte order of a 16-bit value.
#[inline]
pub const fn swap16(value: u16) -> u16 {
    (value >> 8).wrapping_add(value << 8)
}

/// Reverses the byte order of a 32-bit value.
#[inline]
pub const fn swap32(value: u32) -> u32 {
    let odd = value & 0x00FF_00FF;
    let even = value & 0xFF00_FF00;
    odd.rotate_right(8).wrapping_add(even.rotate_left(8))
}

/// Reverses the byte order of a 64-bit value.
#[inline]
pub const fn swap64(value: u64) -> u64 {
    ((swap32(value as u32) as u64) << 32) | swap32((value >> 32) as u32) as u64
}

#[inline]
pub const fn hton16(value: u16) -> u16 {
    if cfg!(target_endian = "little") {
        swap16(value)
    } else {
        value
    }
}

#[inline]
pub const fn hton32(value: u32) -> u32 {
    if cfg!(target_endian = "little") {
        swap32(value)
    } else {
        value
    }
}

#[inline]
pub const fn hton64(value: u64) -> u64 {
    if cfg!(target_endian = "little") {
        swap64(value)
    } else {
        value
    }
}

#[inline]
pub const fn ntoh16(value: u16) -> u16 {
    hton16(value)
}

#[inline]
pub const fn ntoh32(value: u32) -> u32 {
    hton32(value)
}

#[inline]
pub const fn ntoh64(value: u64) -> u64 {
    hton64(value)
}

/// Copies `len` bytes from `src[src_offset..]` into `dst[dst_offset..]`.
///
/// # Panics
///
/// Panics if either range is out of bounds, like `<[u8]>::copy_from_slice`.
pub fn copy_region(dst: &mut [u8], dst_offset: usize, src: &[u8], src_offset: usize, len: usize) {
    let dst = &mut dst[dst_offset..dst_offset + len];
    let src = &src[src_offset..src_offset + len];
    // SAFETY: both ranges were bounds-checked above and a `&mut` cannot alias a `&`.
    unsafe { raw::copy_region(dst.as_mut_ptr(), 0, src.as_ptr(), 0, len) }
}

/// Returns true if `dst[dst_offset..]` and `src[src_offset..]` agree on `len` bytes.
///
/// Stops at the first differing chunk. A zero length always compares equal.
///
/// # Panics
///
/// Panics if either range is out of bounds.
pub fn compare_region(dst: &[u8], dst_offset: usize, src: &[u8], src_offset: usize, len: usize) -> bool {
    let dst = &dst[dst_offset..dst_offset + len];
    let src = &src[src_offset..src_offset + len];
    // SAFETY: both ranges were bounds-checked above.
    unsafe { raw::compare_region(dst.as_ptr(), 0, src.as_ptr(), 0, len) }
}

/// Sets `len` bytes of `dst[offset..]` to `value`.
///
/// # Panics
///
/// Panics if the range is out of bounds.
pub fn fill_region(dst: &mut [u8], offset: usize, value: u8, len: usize) {
    fill_region_pattern(dst, offset, u64::from_ne_bytes([value; 8]), len);
}

/// Repeats the in-memory bytes of `pattern` across `len` bytes of `dst[offset..]`.
///
/// A trailing partial chunk receives the leading bytes of the pattern.
///
/// # Panics
///
/// Panics if the range is out of bounds.
pub fn fill_region_pattern(dst: &mut [u8], offset: usize, pattern: u64, len: usize) {
    let dst = &mut dst[offset..offset + len];
    // SAFETY: the range was bounds-checked above.
    unsafe { raw::fill_region_pattern(dst.as_mut_ptr(), 0, pattern, len) }
}

/// Pointer forms of the region primitives, for memory owned by the provider.
pub mod raw {
    use core::ptr;

    #[inline(always)]
    unsafe fn copy_n<T: Copy>(dst: *mut u8, src: *const u8) {
        ptr::write_unaligned(dst.cast::<T>(), ptr::read_unaligned(src.cast::<T>()));
    }

    #[inline(always)]
    unsafe fn eq_n<T: Copy + PartialEq>(dst: *const u8, src: *const u8) -> bool {
        ptr::read_unaligned(dst.cast::<T>()) == ptr::read_unaligned(src.cast::<T>())
    }

    #[inline(always)]
    unsafe fn copy_tail(dst: *mut u8, src: *const u8, remainder: usize) {
        match remainder {
            1 => copy_n::<u8>(dst, src),
            2 => copy_n::<u16>(dst, src),
            3 => {
                copy_n::<u16>(dst, src);
                copy_n::<u16>(dst.add(1), src.add(1));
            }
            4 => copy_n::<u32>(dst, src),
            5 => {
                copy_n::<u32>(dst, src);
                copy_n::<u32>(dst.add(1), src.add(1));
            }
            6 => {
                copy_n::<u32>(dst, src);
                copy_n::<u32>(dst.add(2), src.add(2));
            }
            7 => {
                copy_n::<u32>(dst, src);
                copy_n::<u32>(dst.add(3), src.add(3));
            }
            _ => {}
        }
    }

    #[inline(always)]
    unsafe fn eq_tail(dst: *const u8, src: *const u8, remainder: usize) -> bool {
        match remainder {
            1 => eq_n::<u8>(dst, src),
            2 => eq_n::<u16>(dst, src),
            3 => eq_n::<u16>(dst, src) && eq_n::<u16>(dst.add(1), src.add(1)),
            4 => eq_n::<u32>(dst, src),
            5 => eq_n::<u32>(dst, src) && eq_n::<u32>(dst.add(1), src.add(1)),
            6 => eq_n::<u32>(dst, src) && eq_n::<u32>(dst.add(2), src.add(2)),
            7 => eq_n::<u32>(dst, src) && eq_n::<u32>(dst.add(3), src.add(3)),
            _ => true,
        }
    }

    /// # Safety
    ///
    /// `dst + dst_offset` must be valid for `len` writes, `src + src_offset`
    /// valid for `len` reads, and the two ranges must not overlap.
    pub unsafe fn copy_region(
        dst: *mut u8,
        dst_offset: usize,
        src: *const u8,
        src_offset: usize,
        len: usize,
    ) {
        let pdst = dst.add(dst_offset);
        let psrc = src.add(src_offset);
        let limit = len & !7;

        let mut cursor = 0;
        while cursor < limit {
            copy_n::<u64>(pdst.add(cursor), psrc.add(cursor));
            cursor += 8;
        }

        copy_tail(pdst.add(limit), psrc.add(limit), len & 7);
    }

    /// # Safety
    ///
    /// Both `dst + dst_offset` and `src + src_offset` must be valid for `len` reads.
    pub unsafe fn compare_region(
        dst: *const u8,
        dst_offset: usize,
        src: *const u8,
        src_offset: usize,
        len: usize,
    ) -> bool {
        let pdst = dst.add(dst_offset);
        let psrc = src.add(src_offset);
        let limit = len & !7;

        let mut cursor = 0;
        while cursor < limit {
            if !eq_n::<u64>(pdst.add(cursor), psrc.add(cursor)) {
                return false;
            }
            cursor += 8;
        }

        eq_tail(pdst.add(limit), psrc.add(limit), len & 7)
    }

    /// # Safety
    ///
    /// `dst + offset` must be valid for `len` writes.
    pub unsafe fn fill_region_pattern(dst: *mut u8, offset: usize, pattern: u64, len: usize) {
        let pdst = dst.add(offset);
        let limit = len & !7;

        let mut cursor = 0;
        while cursor < limit {
            ptr::write_unaligned(pdst.add(cursor).cast::<u64>(), pattern);
            cursor += 8;
        }

        let tail = pattern.to_ne_bytes();
        copy_tail(pdst.add(limit), tail.as_ptr(), len & 7);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;

    fn random_nonzero(len: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(1..=u8::MAX)).collect()
    }

    #[test]
    fn swaps_reverse_byte_order() {
        assert_eq!(swap16(0x1234), 0x3412);
        assert_eq!(swap32(0x1122_3344), 0x4433_2211);
        assert_eq!(swap64(0x0102_0304_0506_0708), 0x0807_0605_0403_0201);
    }

    #[test]
    fn swaps_change_asymmetric_values() {
        let s: u16 = 12345;
        let i: u32 = 1_234_512_345;
        let l: u64 = 12_345_123_451_234_512_345;

        assert_ne!(s, swap16(s));
        assert_eq!(s, swap16(swap16(s)));
        assert_ne!(i, swap32(i));
        assert_eq!(i, swap32(swap32(i)));
        assert_ne!(l, swap64(l));
        assert_eq!(l, swap64(swap64(l)));
    }

    #[test]
    fn hton_matches_big_endian_representation() {
        assert_eq!(hton16(51343), 51343u16.to_be());
        assert_eq!(hton32(0x7f00_0001), 0x7f00_0001u32.to_be());
        assert_eq!(hton64(u64::MAX - 7), (u64::MAX - 7).to_be());
        assert_eq!(ntoh16(hton16(8080)), 8080);
    }

    #[test]
    fn compare_grows_with_each_matching_byte() {
        let src = random_nonzero(16);
        let mut dst = [0u8; 16];

        for i in 1..=src.len() {
            assert!(!compare_region(&dst, 0, &src, 0, i));
            dst[i - 1] = src[i - 1];
            assert!(compare_region(&dst, 0, &src, 0, i));
        }

        for i in 0..src.len() - 1 {
            assert!(compare_region(&dst, i, &src, i, src.len() - i));
        }
    }

    #[test]
    fn compare_detects_difference_at_every_position() {
        let src = random_nonzero(24);
        for len in 1..=src.len() {
            for pos in 0..len {
                let mut dst = src.clone();
                dst[pos] ^= 0xFF;
                assert!(
                    !compare_region(&dst, 0, &src, 0, len),
                    "difference at {pos} missed for length {len}"
                );
            }
        }
    }

    #[test]
    fn compare_zero_length_is_equal() {
        assert!(compare_region(&[1], 0, &[2], 0, 0));
    }

    #[test]
    fn copy_grows_prefix() {
        let src = random_nonzero(16);
        let mut dst = [0u8; 16];

        for i in 1..=src.len() {
            assert!(!compare_region(&dst, 0, &src, 0, i));
            copy_region(&mut dst, 0, &src, 0, i);
            assert!(compare_region(&dst, 0, &src, 0, i));
        }
    }

    #[test]
    fn copy_never_writes_past_length() {
        let src = [0xAAu8; 32];
        for len in 0..24 {
            let mut dst = [0u8; 32];
            copy_region(&mut dst, 3, &src, 5, len);
            assert!(dst[..3].iter().all(|&b| b == 0));
            assert!(dst[3..3 + len].iter().all(|&b| b == 0xAA));
            assert!(dst[3 + len..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    #[should_panic]
    fn copy_out_of_bounds_panics() {
        let mut dst = [0u8; 4];
        copy_region(&mut dst, 2, &[1, 2, 3, 4], 0, 4);
    }

    #[test]
    fn fill_zero() {
        let mut dst = random_nonzero(16);
        let zeros = [0u8; 16];

        assert!(!compare_region(&dst, 0, &zeros, 0, zeros.len()));
        fill_region(&mut dst, 0, 0, zeros.len());
        assert!(compare_region(&dst, 0, &zeros, 0, zeros.len()));
    }

    #[test]
    fn fill_pattern_repeats_every_eight_bytes() {
        let src = random_nonzero(8);
        let mut dst = [0u8; 16];
        let pattern = u64::from_ne_bytes(src[..].try_into().unwrap());

        let len = dst.len();
        fill_region_pattern(&mut dst, 0, pattern, len);
        assert!(compare_region(&dst, 0, &src, 0, 8));
        assert!(compare_region(&dst, 8, &src, 0, 8));
    }

    #[test]
    fn fill_pattern_tail_takes_leading_bytes() {
        let pattern = u64::from_ne_bytes([1, 2, 3, 4, 5, 6, 7, 8]);
        let mut dst = [0u8; 13];
        fill_region_pattern(&mut dst, 0, pattern, 13);
        assert_eq!(dst, [1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn raw_regions_honor_both_offsets() {
        let src = random_nonzero(32);
        let mut dst = [0u8; 32];

        // 13 bytes: one full chunk plus a 5-byte tail.
        unsafe { raw::copy_region(dst.as_mut_ptr(), 3, src.as_ptr(), 5, 13) };
        assert_eq!(&dst[3..16], &src[5..18]);
        assert!(dst[..3].iter().all(|&b| b == 0));
        assert!(dst[16..].iter().all(|&b| b == 0));

        assert!(unsafe { raw::compare_region(dst.as_ptr(), 3, src.as_ptr(), 5, 13) });
        assert!(!unsafe { raw::compare_region(dst.as_ptr(), 3, src.as_ptr(), 4, 13) });
        assert!(!unsafe { raw::compare_region(dst.as_ptr(), 2, src.as_ptr(), 5, 13) });

        let pattern = u64::from_ne_bytes([1, 2, 3, 4, 5, 6, 7, 8]);
        let mut fill = [0u8; 24];
        unsafe { raw::fill_region_pattern(fill.as_mut_ptr(), 5, pattern, 11) };
        assert_eq!(&fill[5..16], &[1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 3]);
        assert!(fill[..5].iter().all(|&b| b == 0));
        assert!(fill[16..].iter().all(|&b| b == 0));
    }

    proptest! {
        #[test]
        fn swap_is_an_involution(a: u16, b: u32, c: u64) {
            prop_assert_eq!(swap16(swap16(a)), a);
            prop_assert_eq!(swap32(swap32(b)), b);
            prop_assert_eq!(swap64(swap64(c)), c);
        }

        #[test]
        fn swaps_agree_with_core(a: u16, b: u32, c: u64) {
            prop_assert_eq!(swap16(a), a.swap_bytes());
            prop_assert_eq!(swap32(b), b.swap_bytes());
            prop_assert_eq!(swap64(c), c.swap_bytes());
        }

        #[test]
        fn copy_then_compare(
            src in proptest::collection::vec(any::<u8>(), 0..96),
            dst_offset in 0usize..9,
        ) {
            let mut dst = vec![0u8; src.len() + dst_offset];
            copy_region(&mut dst, dst_offset, &src, 0, src.len());
            prop_assert!(compare_region(&dst, dst_offset, &src, 0, src.len()));
            prop_assert_eq!(&dst[dst_offset..], &src[..]);
        }

        #[test]
        fn compare_agrees_with_slice_eq(
            a in proptest::collection::vec(any::<u8>(), 0..40),
            flip in any::<proptest::sample::Index>(),
        ) {
            let mut b = a.clone();
            if !b.is_empty() {
                let i = flip.index(b.len());
                b[i] = b[i].wrapping_add(1);
            }
            prop_assert_eq!(compare_region(&a, 0, &b, 0, a.len()), a == b);
        }
    }
}
