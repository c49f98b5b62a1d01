use core::fmt;
use core::marker::PhantomData;

/// One gather segment: a borrowed pointer and a length the provider reads.
///
/// Field order and length width follow the provider's native buffer type on
/// each platform. On Windows the length is a `u32` placed before the pointer
/// (the `WSABUF` shape); everywhere else the pointer comes first and the
/// length is pointer-sized (the `iovec` shape). The buffer never owns the
/// bytes; the borrow keeps them alive for as long as the segment exists.
///
/// A `Buffer` may point at read-only memory. Receive calls take
/// [`BufferMut`] instead, which has the same layout.
#[cfg(windows)]
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Buffer<'a> {
    len: u32,
    base: *mut u8,
    _marker: PhantomData<&'a [u8]>,
}

#[cfg(not(windows))]
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Buffer<'a> {
    base: *mut u8,
    len: usize,
    _marker: PhantomData<&'a [u8]>,
}

/// Segment length as `WSABUF` stores it. Longer slices are clamped, so the
/// provider never touches more than the borrow covers.
#[cfg(any(windows, test))]
fn wsabuf_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl<'a> Buffer<'a> {
    /// Segment over bytes the provider will only read (send path).
    ///
    /// On Windows a slice longer than `u32::MAX` bytes is clamped to that
    /// length.
    pub fn for_send(bytes: &'a [u8]) -> Self {
        Self::from_parts(bytes.as_ptr().cast_mut(), bytes.len())
    }

    /// Segment over caller-managed memory.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads of `len` bytes for the whole of `'a`.
    pub unsafe fn from_raw(base: *const u8, len: usize) -> Self {
        Self::from_parts(base.cast_mut(), len)
    }

    #[cfg(windows)]
    fn from_parts(base: *mut u8, len: usize) -> Self {
        Self {
            len: wsabuf_len(len),
            base,
            _marker: PhantomData,
        }
    }

    #[cfg(not(windows))]
    fn from_parts(base: *mut u8, len: usize) -> Self {
        Self {
            base,
            len,
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("base", &self.base)
            .field("len", &self.len)
            .finish()
    }
}

/// One scatter segment the provider may overwrite (receive path).
///
/// Same memory layout as [`Buffer`]; only the borrow differs. A slice of
/// these is passed to the provider exactly as a slice of `Buffer` would be.
#[repr(transparent)]
pub struct BufferMut<'a> {
    inner: Buffer<'a>,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> BufferMut<'a> {
    /// Segment over bytes the provider will write into.
    ///
    /// On Windows a slice longer than `u32::MAX` bytes is clamped to that
    /// length.
    pub fn for_recv(bytes: &'a mut [u8]) -> Self {
        Self {
            inner: Buffer::from_parts(bytes.as_mut_ptr(), bytes.len()),
            _marker: PhantomData,
        }
    }

    /// Writable segment over caller-managed memory.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `len` bytes for the whole
    /// of `'a`, and nothing else may access that memory meanwhile.
    pub unsafe fn from_raw(base: *mut u8, len: usize) -> Self {
        Self {
            inner: Buffer::from_parts(base, len),
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.inner.base
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.inner.base
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Read-only view of the same segment.
    pub fn as_buffer(&self) -> &Buffer<'a> {
        &self.inner
    }
}

impl fmt::Debug for BufferMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferMut")
            .field("base", &self.inner.base)
            .field("len", &self.inner.len)
            .finish()
    }
}
